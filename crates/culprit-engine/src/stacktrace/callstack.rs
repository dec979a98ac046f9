//! Call stacks and the stacktrace that groups them.

use super::frame::StackFrame;
use serde::{Deserialize, Serialize};

/// Line format the upstream parser used for a call stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStackFormat {
    /// `#0 0x32b5982 in get third_party/WebKit/Source/wtf/RefPtr.h:61:43`
    #[default]
    Default,
    /// `at com.android.commands.am.Am.onRun(Am.java:353)`
    Java,
    /// `chrome_child!v8::internal::ApplyTransition+0x93 [v8/src/lookup.cc @ 340]`
    Syzyasan,
}

/// Source language of a call stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageType {
    Cpp,
    Java,
}

impl From<CallStackFormat> for LanguageType {
    fn from(format: CallStackFormat) -> Self {
        match format {
            CallStackFormat::Java => LanguageType::Java,
            CallStackFormat::Default | CallStackFormat::Syzyasan => LanguageType::Cpp,
        }
    }
}

/// An ordered sequence of frames, in crash order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallStack {
    /// Smaller is higher blame priority; 0 is the crashing thread
    pub priority: u32,

    /// Frames, innermost first
    #[serde(default)]
    pub frames: Vec<StackFrame>,

    /// Line format used upstream
    #[serde(default)]
    pub format_type: CallStackFormat,

    /// Explicit language; derived from `format_type` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language_type: Option<LanguageType>,
}

impl CallStack {
    /// Create a call stack whose language follows its format
    pub fn new(priority: u32, frames: Vec<StackFrame>, format_type: CallStackFormat) -> Self {
        Self {
            priority,
            frames,
            format_type,
            language_type: None,
        }
    }

    /// Builder: override the language (e.g. Java frames in default format)
    pub fn with_language(mut self, language_type: LanguageType) -> Self {
        self.language_type = Some(language_type);
        self
    }

    pub fn language_type(&self) -> LanguageType {
        self.language_type
            .unwrap_or_else(|| LanguageType::from(self.format_type))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// All call stacks of one crash, with one designated crash stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawStacktrace")]
pub struct Stacktrace {
    pub stacks: Vec<CallStack>,

    /// Index into `stacks` of the crash stack
    crash_stack_index: Option<usize>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStacktrace {
    #[serde(default)]
    stacks: Vec<CallStack>,
    #[serde(default)]
    crash_stack_index: Option<usize>,
}

impl From<RawStacktrace> for Stacktrace {
    fn from(raw: RawStacktrace) -> Self {
        match raw.crash_stack_index {
            Some(index) => Stacktrace::with_crash_stack(raw.stacks, index),
            None => Stacktrace::new(raw.stacks),
        }
    }
}

impl Stacktrace {
    /// Build a stacktrace whose crash stack is the first non-empty stack
    /// with the numerically smallest priority.
    pub fn new(stacks: Vec<CallStack>) -> Self {
        let crash_stack_index = stacks
            .iter()
            .enumerate()
            .filter(|(_, stack)| !stack.is_empty())
            .min_by_key(|(index, stack)| (stack.priority, *index))
            .map(|(index, _)| index)
            .or_else(|| {
                stacks
                    .iter()
                    .enumerate()
                    .min_by_key(|(index, stack)| (stack.priority, *index))
                    .map(|(index, _)| index)
            });

        Self {
            stacks,
            crash_stack_index,
        }
    }

    /// Build a stacktrace with an explicitly chosen crash stack.
    ///
    /// Out-of-range indices fall back to [`Stacktrace::new`]'s choice.
    pub fn with_crash_stack(stacks: Vec<CallStack>, index: usize) -> Self {
        if index < stacks.len() {
            Self {
                stacks,
                crash_stack_index: Some(index),
            }
        } else {
            Self::new(stacks)
        }
    }

    /// The stack selected for display and priority
    pub fn crash_stack(&self) -> Option<&CallStack> {
        self.crash_stack_index.and_then(|index| self.stacks.get(index))
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Every frame across all stacks, with the priority of its stack
    pub fn frames(&self) -> impl Iterator<Item = (&StackFrame, u32)> {
        self.stacks
            .iter()
            .flat_map(|stack| stack.frames.iter().map(move |frame| (frame, stack.priority)))
    }

    /// Copy of this stacktrace with every frame passed through `f`
    pub fn map_frames<F>(&self, f: F) -> Stacktrace
    where
        F: Fn(&StackFrame) -> StackFrame,
    {
        let stacks = self
            .stacks
            .iter()
            .map(|stack| CallStack {
                frames: stack.frames.iter().map(&f).collect(),
                ..stack.clone()
            })
            .collect();

        Stacktrace {
            stacks,
            crash_stack_index: self.crash_stack_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: u32) -> StackFrame {
        StackFrame::new(index, "src/", "f", "a.cc", "src/a.cc", vec![1])
    }

    #[test]
    fn test_language_follows_format() {
        let java = CallStack::new(0, vec![], CallStackFormat::Java);
        assert_eq!(java.language_type(), LanguageType::Java);

        let cpp = CallStack::new(0, vec![], CallStackFormat::Default);
        assert_eq!(cpp.language_type(), LanguageType::Cpp);
        assert_eq!(
            cpp.with_language(LanguageType::Java).language_type(),
            LanguageType::Java
        );
    }

    #[test]
    fn test_crash_stack_is_highest_priority_non_empty() {
        let stacks = vec![
            CallStack::new(2, vec![frame(0)], CallStackFormat::Default),
            CallStack::new(0, vec![], CallStackFormat::Default),
            CallStack::new(1, vec![frame(0)], CallStackFormat::Default),
        ];
        let trace = Stacktrace::new(stacks);
        assert_eq!(trace.crash_stack().unwrap().priority, 1);
    }

    #[test]
    fn test_explicit_crash_stack() {
        let stacks = vec![
            CallStack::new(0, vec![frame(0)], CallStackFormat::Default),
            CallStack::new(1, vec![frame(1)], CallStackFormat::Default),
        ];
        let trace = Stacktrace::with_crash_stack(stacks, 1);
        assert_eq!(trace.crash_stack().unwrap().priority, 1);
    }

    #[test]
    fn test_empty_stacktrace() {
        let trace = Stacktrace::new(vec![]);
        assert!(trace.is_empty());
        assert!(trace.crash_stack().is_none());
    }

    #[test]
    fn test_frames_carry_stack_priority() {
        let trace = Stacktrace::new(vec![
            CallStack::new(0, vec![frame(0), frame(1)], CallStackFormat::Default),
            CallStack::new(3, vec![frame(0)], CallStackFormat::Default),
        ]);
        let priorities: Vec<u32> = trace.frames().map(|(_, priority)| priority).collect();
        assert_eq!(priorities, vec![0, 0, 3]);
    }
}

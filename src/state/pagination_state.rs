/// Pagination state definitions for a single category traversal
use std::fmt;

/// Represents the current phase of a category's listing traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaginationState {
    /// Navigating to the category listing URL
    LoadingPage,

    /// Scrolling the current page and reading its product stubs
    Extracting,

    /// Recording and visiting stubs whose URL has not been seen yet
    ProcessingNewProducts,

    /// Deciding between the next page and the end of the category
    Advancing,

    /// The category is finished, successfully or not
    Done,
}

/// Why a category traversal stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// A disabled "next" control marked the last page
    LastPage,

    /// No enabled "next" control could be found
    NoNextControl,

    /// Processing a page failed; remaining pages were abandoned
    PageFailed { page: u32, message: String },
}

impl PaginationState {
    /// Returns true if `next` is a legal successor of this state
    ///
    /// Any non-terminal state may jump to `Done` when a page fails.
    pub fn can_transition_to(&self, next: Self) -> bool {
        use PaginationState::*;

        match (self, next) {
            (Done, _) => false,
            (_, Done) => true,
            (LoadingPage, Extracting) => true,
            (Extracting, ProcessingNewProducts) => true,
            (Extracting, Advancing) => true,
            (ProcessingNewProducts, Advancing) => true,
            (Advancing, Extracting) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoadingPage => "loading_page",
            Self::Extracting => "extracting",
            Self::ProcessingNewProducts => "processing_new_products",
            Self::Advancing => "advancing",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for PaginationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LastPage => write!(f, "reached last page"),
            Self::NoNextControl => write!(f, "no enabled next control"),
            Self::PageFailed { page, message } => {
                write!(f, "page {} failed: {}", page, message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        use PaginationState::*;

        assert!(LoadingPage.can_transition_to(Extracting));
        assert!(Extracting.can_transition_to(ProcessingNewProducts));
        assert!(Extracting.can_transition_to(Advancing));
        assert!(ProcessingNewProducts.can_transition_to(Advancing));
        assert!(Advancing.can_transition_to(Extracting));
        assert!(Advancing.can_transition_to(Done));
    }

    #[test]
    fn test_illegal_transitions() {
        use PaginationState::*;

        assert!(!LoadingPage.can_transition_to(Advancing));
        assert!(!ProcessingNewProducts.can_transition_to(Extracting));
        assert!(!Advancing.can_transition_to(LoadingPage));
        assert!(!Done.can_transition_to(Extracting));
        assert!(!Done.can_transition_to(Done));
    }

    #[test]
    fn test_any_active_state_can_fail() {
        use PaginationState::*;

        for state in [LoadingPage, Extracting, ProcessingNewProducts, Advancing] {
            assert!(state.can_transition_to(Done), "{} -> done", state);
        }
    }

    #[test]
    fn test_termination_display() {
        assert_eq!(Termination::LastPage.to_string(), "reached last page");
        assert_eq!(
            Termination::PageFailed {
                page: 3,
                message: "timeout".to_string()
            }
            .to_string(),
            "page 3 failed: timeout"
        );
    }
}

/// Detail workflow state definitions for a single product page
use std::fmt;

/// Represents the current phase of a product's detail extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailState {
    /// Navigating to the product URL
    Arrive,

    /// Optional "choose manually" configuration
    Configure,

    /// Enumerating provider triggers
    Providers,

    /// A provider popup (or all of them, when not recording) was clicked open
    Open,

    /// Clicking the "Size" panel entries
    SelectSizeView,

    /// Reading variant rows from the size table
    Harvest,

    /// Dismissing the provider popup
    Close,

    /// Nothing left to do for this product
    Finished,
}

impl DetailState {
    /// Returns true if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: Self) -> bool {
        use DetailState::*;

        matches!(
            (self, next),
            (Arrive, Configure)
                | (Configure, Providers)
                | (Providers, Open)
                | (Providers, Finished)
                | (Open, SelectSizeView)
                | (SelectSizeView, Harvest)
                | (SelectSizeView, Finished)
                | (Harvest, Close)
                | (Close, Open)
                | (Close, Finished)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arrive => "arrive",
            Self::Configure => "configure",
            Self::Providers => "providers",
            Self::Open => "open",
            Self::SelectSizeView => "select_size_view",
            Self::Harvest => "harvest",
            Self::Close => "close",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for DetailState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_cycle() {
        use DetailState::*;

        let path = [
            Arrive,
            Configure,
            Providers,
            Open,
            SelectSizeView,
            Harvest,
            Close,
            Open,
            SelectSizeView,
            Harvest,
            Close,
            Finished,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_visit_only_cycle() {
        use DetailState::*;

        assert!(Providers.can_transition_to(Open));
        assert!(Open.can_transition_to(SelectSizeView));
        assert!(SelectSizeView.can_transition_to(Finished));
    }

    #[test]
    fn test_zero_providers_finishes() {
        assert!(DetailState::Providers.can_transition_to(DetailState::Finished));
    }

    #[test]
    fn test_illegal_transitions() {
        use DetailState::*;

        assert!(!Arrive.can_transition_to(Providers));
        assert!(!Open.can_transition_to(Harvest));
        assert!(!Harvest.can_transition_to(Open));
        assert!(!Finished.can_transition_to(Arrive));
    }
}

//! Frozen magnitude frame kept for comparison against the live signal.

/// Holds at most one owned copy of a magnitude frame.
///
/// The live buffer belongs to the spectrum source and is overwritten every
/// tick, so saving always copies.
#[derive(Debug, Default, Clone)]
pub struct SavedFrame {
    bins: Option<Vec<u8>>,
}

impl SavedFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies `live` into the store, replacing any previous frame.
    pub fn save(&mut self, live: &[u8]) {
        self.bins = Some(live.to_vec());
        tracing::info!("Frame saved for comparison ({} bins)", live.len());
    }

    pub fn clear(&mut self) {
        if self.bins.take().is_some() {
            tracing::info!("Saved frame cleared");
        }
    }

    pub fn get(&self) -> Option<&[u8]> {
        self.bins.as_deref()
    }

    pub fn is_saved(&self) -> bool {
        self.bins.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_copies_live_buffer() {
        let mut live = vec![10u8, 20, 30];
        let mut store = SavedFrame::new();
        store.save(&live);

        live[1] = 250;

        assert_eq!(store.get(), Some(&[10u8, 20, 30][..]));
    }

    #[test]
    fn test_save_replaces_and_clear_discards() {
        let mut store = SavedFrame::new();
        store.save(&[1, 2]);
        store.save(&[3, 4, 5]);
        assert_eq!(store.get(), Some(&[3u8, 4, 5][..]));

        store.clear();
        assert!(!store.is_saved());
        assert_eq!(store.get(), None);
    }
}

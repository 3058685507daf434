//! Zoom level → hierarchy truncation.

use tracing::debug;

use super::hierarchy::{AdminHierarchyChain, ChainEntry};
use crate::config::{DEFAULT_ZOOM_RANKS, ZOOM_LEVELS};
use crate::error::ReverseError;

pub const MAX_ZOOM: u8 = (ZOOM_LEVELS - 1) as u8;

/// Step function from zoom level to the most detailed address rank kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoomTable {
    ranks: [u8; ZOOM_LEVELS],
}

impl Default for ZoomTable {
    fn default() -> Self {
        Self {
            ranks: DEFAULT_ZOOM_RANKS,
        }
    }
}

impl ZoomTable {
    /// Build a table, rejecting tables that are not non-decreasing.
    pub fn new(ranks: &[u8]) -> Result<Self, ReverseError> {
        let ranks: [u8; ZOOM_LEVELS] = ranks.try_into().map_err(|_| {
            ReverseError::InvalidConfig(format!(
                "zoom table needs {} entries, got {}",
                ZOOM_LEVELS,
                ranks.len()
            ))
        })?;
        if ranks.windows(2).any(|w| w[0] > w[1]) {
            return Err(ReverseError::InvalidConfig(
                "zoom table must be non-decreasing".to_string(),
            ));
        }
        Ok(Self { ranks })
    }

    /// Clamp any requested zoom into 0..=18.
    pub fn clamp(zoom: i32) -> u8 {
        zoom.clamp(0, i32::from(MAX_ZOOM)) as u8
    }

    /// Most detailed rank kept at `zoom` (clamped).
    pub fn max_rank(&self, zoom: i32) -> u8 {
        self.ranks[usize::from(Self::clamp(zoom))]
    }

    /// Chain entries at or above the zoom's detail level, in chain order.
    ///
    /// At the maximum zoom the matched object (first entry) is always kept.
    pub fn truncate(&self, chain: &AdminHierarchyChain, zoom: i32) -> Vec<ChainEntry> {
        let zoom = Self::clamp(zoom);
        let max_rank = self.ranks[usize::from(zoom)];

        let kept: Vec<ChainEntry> = chain
            .entries()
            .iter()
            .enumerate()
            .filter(|(pos, entry)| {
                entry.rank_address <= max_rank || (*pos == 0 && zoom == MAX_ZOOM)
            })
            .map(|(_, entry)| *entry)
            .collect();

        debug!(
            "zoom {} keeps ranks <= {}: {} of {} levels",
            zoom,
            max_rank,
            kept.len(),
            chain.len()
        );
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, CITY, COUNTRY, COUNTY, HOUSE, STATE, STREET, SUBURB};
    use crate::models::PlaceId;
    use crate::resolve::hierarchy::build_chain;

    fn house_chain() -> AdminHierarchyChain {
        let store = fixtures::birmingham_store();
        build_chain(&store, store.get(HOUSE).unwrap(), 32)
    }

    fn ids(entries: &[ChainEntry]) -> Vec<PlaceId> {
        entries.iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_documented_steps() {
        let table = ZoomTable::default();
        assert_eq!(table.max_rank(3), 4);
        assert_eq!(table.max_rank(5), 8);
        assert_eq!(table.max_rank(8), 12);
        assert_eq!(table.max_rank(10), 16);
        assert_eq!(table.max_rank(14), 22);
        assert_eq!(table.max_rank(16), 26);
        assert_eq!(table.max_rank(17), 27);
        assert_eq!(table.max_rank(18), 30);
    }

    #[test]
    fn test_out_of_range_zoom_is_clamped() {
        let table = ZoomTable::default();
        assert_eq!(table.max_rank(-4), table.max_rank(0));
        assert_eq!(table.max_rank(25), table.max_rank(18));
        assert_eq!(ZoomTable::clamp(99), 18);
    }

    #[test]
    fn test_truncate_levels() {
        let table = ZoomTable::default();
        let chain = house_chain();

        assert_eq!(
            ids(&table.truncate(&chain, 18)),
            vec![HOUSE, STREET, SUBURB, CITY, COUNTY, STATE, COUNTRY]
        );
        assert_eq!(
            ids(&table.truncate(&chain, 16)),
            vec![STREET, SUBURB, CITY, COUNTY, STATE, COUNTRY]
        );
        assert_eq!(
            ids(&table.truncate(&chain, 10)),
            vec![CITY, COUNTY, STATE, COUNTRY]
        );
        assert_eq!(ids(&table.truncate(&chain, 3)), vec![COUNTRY]);
        assert!(table.truncate(&chain, 0).is_empty());
    }

    #[test]
    fn test_lower_zoom_never_adds_detail() {
        let table = ZoomTable::default();
        let chain = house_chain();

        let mut previous = table.truncate(&chain, 18);
        for zoom in (0..18).rev() {
            let current = table.truncate(&chain, zoom);
            assert!(current.len() <= previous.len());
            // Every kept entry was kept at the higher zoom too, in the same order
            assert!(previous.ends_with(&current));
            previous = current;
        }
    }

    #[test]
    fn test_matched_object_kept_at_max_zoom() {
        // A custom table whose last step stops at streets still keeps the match at zoom 18
        let mut ranks = DEFAULT_ZOOM_RANKS;
        ranks[18] = 27;
        let table = ZoomTable::new(&ranks).unwrap();
        let chain = house_chain();

        assert_eq!(table.truncate(&chain, 18).first().map(|e| e.id), Some(HOUSE));
        assert_eq!(table.truncate(&chain, 17).first().map(|e| e.id), Some(STREET));
    }

    #[test]
    fn test_rejects_bad_tables() {
        assert!(ZoomTable::new(&[4, 8]).is_err());
        let mut ranks = DEFAULT_ZOOM_RANKS;
        ranks[4] = 20;
        assert!(ZoomTable::new(&ranks).is_err());
    }
}

//! Media thumbnail selection.
//!
//! An item may declare several `<media:thumbnail>` elements at different
//! resolutions. Without buffering them, the selector keeps the best one
//! seen so far according to a fixed tier ranking, so the result does not
//! depend on declaration order for ranked tiers.

use super::model::Item;
use super::names::{normalize, normalize_namespace};
use super::tokenizer::XmlAttribute;

/// Media RSS namespace (`media:thumbnail`).
pub const MEDIA_NAMESPACE: &str = "http://search.yahoo.com/mrss/";
/// YouTube extension namespace carrying the thumbnail tier name (`yt:name`).
pub const VIDEO_NAMESPACE: &str = "http://www.youtube.com/xml/schemas/2015";

/// Tier names, highest resolution first.
const TIER_RANKING: [&str; 4] = ["sddefault", "hqdefault", "mqdefault", "default"];

/// Rank of a tier name; higher is better. Unknown names have no rank.
pub fn tier_rank(name: &str) -> Option<usize> {
    TIER_RANKING
        .iter()
        .position(|tier| *tier == name)
        .map(|pos| TIER_RANKING.len() - pos)
}

/// A thumbnail declaration pulled from one element's attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    pub tier: String,
}

impl Candidate {
    /// Reads `url` (any namespace) and `name` (only in `video_namespace`,
    /// which must already be case-folded).
    pub fn from_attributes(attributes: &[XmlAttribute], video_namespace: &str) -> Self {
        let mut candidate = Self::default();
        for attr in attributes {
            let name = normalize(&attr.name);
            if name.is("url") {
                candidate.url = attr.value.clone();
            } else if name.is("name") && name.in_namespace(video_namespace) {
                candidate.tier = attr.value.clone();
            }
        }
        candidate
    }
}

/// Namespaces that identify thumbnail elements and their tier attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailNamespaces {
    media: String,
    video: String,
}

impl ThumbnailNamespaces {
    pub fn new(media: &str, video: &str) -> Self {
        Self {
            media: normalize_namespace(media),
            video: normalize_namespace(video),
        }
    }

    pub fn media(&self) -> &str {
        &self.media
    }

    pub fn video(&self) -> &str {
        &self.video
    }
}

impl Default for ThumbnailNamespaces {
    fn default() -> Self {
        Self::new(MEDIA_NAMESPACE, VIDEO_NAMESPACE)
    }
}

/// Whether `candidate` should replace the item's current thumbnail.
///
/// The first candidate always wins an empty slot. After that a candidate
/// needs a ranked tier at least as good as the stored one; anything beats
/// an unranked stored tier.
pub fn should_replace(item: &Item, candidate: &Candidate) -> bool {
    if item.image.is_empty() {
        return true;
    }
    match (tier_rank(&candidate.tier), tier_rank(&item.image_source)) {
        (Some(new), Some(current)) => new >= current,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Offers `candidate` to `item`, keeping the better of the two.
pub fn offer(item: &mut Item, candidate: Candidate) {
    if should_replace(item, &candidate) {
        tracing::trace!(url = %candidate.url, tier = %candidate.tier, "Selected thumbnail");
        item.image = candidate.url;
        item.image_source = candidate.tier;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::tokenizer::XmlName;
    use chrono::Utc;

    fn candidate(url: &str, tier: &str) -> Candidate {
        Candidate {
            url: url.to_string(),
            tier: tier.to_string(),
        }
    }

    fn select(candidates: &[(&str, &str)]) -> (String, String) {
        let mut item = Item::new(Utc::now());
        for (url, tier) in candidates {
            offer(&mut item, candidate(url, tier));
        }
        (item.image, item.image_source)
    }

    #[test]
    fn test_ranking_order() {
        assert!(tier_rank("sddefault") > tier_rank("hqdefault"));
        assert!(tier_rank("hqdefault") > tier_rank("mqdefault"));
        assert!(tier_rank("mqdefault") > tier_rank("default"));
        assert_eq!(tier_rank("maxresdefault"), None);
    }

    #[test]
    fn test_first_candidate_fills_empty_slot() {
        assert_eq!(
            select(&[("a", "whatever")]),
            ("a".to_string(), "whatever".to_string())
        );
    }

    #[test]
    fn test_sddefault_wins_in_either_order() {
        let forward = select(&[("mq", "mqdefault"), ("sd", "sddefault")]);
        let reverse = select(&[("sd", "sddefault"), ("mq", "mqdefault")]);
        assert_eq!(forward, ("sd".to_string(), "sddefault".to_string()));
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_full_ladder_any_order() {
        let tiers = [
            ("d", "default"),
            ("mq", "mqdefault"),
            ("hq", "hqdefault"),
            ("sd", "sddefault"),
        ];
        let mut reversed = tiers;
        reversed.reverse();
        assert_eq!(select(&tiers).1, "sddefault");
        assert_eq!(select(&reversed).1, "sddefault");
    }

    #[test]
    fn test_lower_tier_does_not_replace_higher() {
        assert_eq!(select(&[("hq", "hqdefault"), ("d", "default")]).0, "hq");
        assert_eq!(select(&[("hq", "hqdefault"), ("mq", "mqdefault")]).0, "hq");
    }

    #[test]
    fn test_same_tier_later_wins() {
        assert_eq!(select(&[("a", "hqdefault"), ("b", "hqdefault")]).0, "b");
    }

    #[test]
    fn test_unranked_candidate_only_fills_empty_slot() {
        assert_eq!(select(&[("d", "default"), ("x", "")]).0, "d");
    }

    #[test]
    fn test_ranked_candidate_replaces_unranked() {
        assert_eq!(select(&[("x", ""), ("d", "default")]).0, "d");
    }

    #[test]
    fn test_candidate_reads_namespaced_name_only() {
        let video = normalize_namespace(VIDEO_NAMESPACE);
        let attrs = vec![
            XmlAttribute::new(XmlName::unqualified("URL"), "https://i.ytimg.com/hq.jpg"),
            XmlAttribute::new(XmlName::unqualified("name"), "sddefault"),
            XmlAttribute::new(
                XmlName::new("name", "http://www.YouTube.com/xml/schemas/2015"),
                "hqdefault",
            ),
        ];
        let c = Candidate::from_attributes(&attrs, &video);
        assert_eq!(c.url, "https://i.ytimg.com/hq.jpg");
        assert_eq!(c.tier, "hqdefault");
    }
}

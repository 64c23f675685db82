//! Case folding for element and attribute names.
//!
//! Every classification decision in the engine compares case-folded names,
//! so `<PubDate>`, `<pubDate>` and `<pubdate>` are the same element, and a
//! namespace declared as `http://Search.Yahoo.com/mrss/` matches the
//! canonical media namespace.

use super::tokenizer::XmlName;

/// Atom 1.0 namespace URI, already case-folded.
pub const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/atom";

/// A name whose local part and namespace URI are both lower-case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedName {
    pub local: String,
    pub namespace: String,
}

impl NormalizedName {
    /// True when the local name equals `local` (which must already be lower-case).
    pub fn is(&self, local: &str) -> bool {
        self.local == local
    }

    /// True when the element or attribute carries no namespace.
    pub fn is_unqualified(&self) -> bool {
        self.namespace.is_empty()
    }

    /// True when the namespace URI equals `namespace` (already case-folded).
    pub fn in_namespace(&self, namespace: &str) -> bool {
        self.namespace == namespace
    }
}

/// Case-folds a raw name. Pure and total.
pub fn normalize(name: &XmlName) -> NormalizedName {
    NormalizedName {
        local: name.local.to_lowercase(),
        namespace: name.namespace.to_lowercase(),
    }
}

/// Case-folds a configured namespace URI so it can be compared with
/// [`NormalizedName::namespace`].
pub fn normalize_namespace(uri: &str) -> String {
    uri.to_lowercase()
}

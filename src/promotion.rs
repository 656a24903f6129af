use serde::{Deserialize, Serialize};

/// One prize entry, occupying one equal angular segment of the wheel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub label: String,
    /// May be empty; may carry inline markup the renderer interprets.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cta: Option<CallToAction>,
}

impl Promotion {
    /// Builds an entry when the label is non-empty after whitespace
    /// collapsing; a label-less row is not a promotion.
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Option<Self> {
        let label = collapse_whitespace(&label.into());
        if label.is_empty() {
            return None;
        }
        Some(Self {
            label,
            description: description.into().trim().to_string(),
            cta: None,
        })
    }

    pub fn with_cta(mut self, cta: Option<CallToAction>) -> Self {
        self.cta = cta;
        self
    }
}

/// Claim link attached to a winning entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallToAction {
    pub text: String,
    pub href: String,
}

impl CallToAction {
    /// Builds a CTA only when the href carries an allowed scheme.
    /// `javascript:`, `data:` and `vbscript:` URLs are rejected outright.
    pub fn checked(text: impl Into<String>, href: impl Into<String>) -> Option<Self> {
        let href = href.into().trim().to_string();
        if href.is_empty() || !href_allowed(&href) {
            return None;
        }
        Some(Self {
            text: text.into(),
            href,
        })
    }
}

const BLOCKED_SCHEMES: &[&str] = &["javascript:", "data:", "vbscript:"];
const ALLOWED_PREFIXES: &[&str] = &["http:", "https:", "mailto:", "tel:", "/", "."];

fn href_allowed(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    if BLOCKED_SCHEMES.iter().any(|s| lower.starts_with(s)) {
        return false;
    }
    ALLOWED_PREFIXES.iter().any(|s| lower.starts_with(s))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One promotion row as the content-parsing collaborator delivers it.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RawPromotion {
    pub label: String,
    pub description: String,
    pub cta_text: String,
    pub cta_href: String,
}

impl RawPromotion {
    /// `None` when the label is empty. A CTA with no text of its own takes
    /// the configured button text; a blocked href yields no CTA at all.
    pub fn normalize(&self, fallback_cta_text: &str) -> Option<Promotion> {
        let promotion = Promotion::new(&self.label, &self.description)?;
        let cta = if self.cta_href.trim().is_empty() {
            None
        } else {
            let text = match self.cta_text.trim() {
                "" => fallback_cta_text,
                text => text,
            };
            CallToAction::checked(text, &self.cta_href)
        };
        Some(promotion.with_cta(cta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_labels_are_rejected() {
        assert!(Promotion::new("", "desc").is_none());
        assert!(Promotion::new("  \t ", "desc").is_none());
    }

    #[test]
    fn labels_are_whitespace_collapsed() {
        let promo = Promotion::new("  Free\n  Shipping ", "").unwrap();
        assert_eq!(promo.label, "Free Shipping");
    }

    #[test]
    fn href_scheme_filtering() {
        assert!(CallToAction::checked("Go", "https://example.com/deal").is_some());
        assert!(CallToAction::checked("Go", "http://example.com").is_some());
        assert!(CallToAction::checked("Go", "mailto:deals@example.com").is_some());
        assert!(CallToAction::checked("Go", "tel:+15551234").is_some());
        assert!(CallToAction::checked("Go", "/offers/spring").is_some());
        assert!(CallToAction::checked("Go", "./claim").is_some());

        assert!(CallToAction::checked("Go", "javascript:alert(1)").is_none());
        assert!(CallToAction::checked("Go", "JavaScript:alert(1)").is_none());
        assert!(CallToAction::checked("Go", "data:text/html,hi").is_none());
        assert!(CallToAction::checked("Go", "vbscript:msgbox").is_none());
        assert!(CallToAction::checked("Go", "ftp://example.com").is_none());
        assert!(CallToAction::checked("Go", "").is_none());
    }

    #[test]
    fn raw_rows_normalize_with_cta_fallback_text() {
        let raw = RawPromotion {
            label: "20% off".to_string(),
            description: "Code SPRING".to_string(),
            cta_text: String::new(),
            cta_href: "https://example.com/spring".to_string(),
        };

        let promo = raw.normalize("Claim Offer").unwrap();
        let cta = promo.cta.unwrap();
        assert_eq!(cta.text, "Claim Offer");
        assert_eq!(cta.href, "https://example.com/spring");
    }

    #[test]
    fn blocked_href_drops_the_cta_but_keeps_the_entry() {
        let raw = RawPromotion {
            label: "Mystery prize".to_string(),
            description: String::new(),
            cta_text: "Claim".to_string(),
            cta_href: "javascript:void(0)".to_string(),
        };

        let promo = raw.normalize("Claim Offer").unwrap();
        assert!(promo.cta.is_none());
    }
}

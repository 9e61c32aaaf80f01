//! HIT definitions shared by every scenario that creates a HIT.

use std::path::Path;
use std::str::FromStr;

use bigdecimal::BigDecimal;

use crate::error::{Error, Result};
use crate::model::{HitParams, HitTypeParams, Price};

/// Question template shipped with the crate, relative to the crate root.
pub const DEFAULT_TEMPLATE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/templates/HTMLQuestion.xml");

pub const TITLE: &str = "EXAMPLE";
pub const DESCRIPTION: &str = "Answer the questions on the screen";
pub const KEYWORDS: &str = "test, HIT";
/// Three minutes per assignment.
pub const ASSIGNMENT_DURATION_SECS: u64 = 180;
pub const AUTO_APPROVAL_DELAY_SECS: u64 = 0;
pub const MAX_ASSIGNMENTS: u32 = 1;
/// Three days.
pub const LIFETIME_SECS: u64 = 86_400 * 3;
pub const REWARD_USD: &str = "0.01";

/// HTML-escape `raw` the way requesters have always submitted questions:
/// `& < > "` as named entities, `'` as `&#39;`.
pub fn escape_question(raw: &str) -> String {
    quick_xml::escape::escape(raw).replace("&apos;", "&#39;")
}

/// Build a fresh HIT definition. The template is read (and HTML-escaped)
/// on every call, so edits to the file show up without a restart.
pub fn hit_params(template: &Path) -> Result<HitParams> {
    let raw = std::fs::read_to_string(template).map_err(|source| Error::Template {
        path: template.to_path_buf(),
        source,
    })?;
    let amount = BigDecimal::from_str(REWARD_USD)
        .map_err(|e| Error::Other(format!("bad reward amount: {e}")))?;

    Ok(HitParams {
        hit_type: HitTypeParams {
            title: TITLE.to_string(),
            description: DESCRIPTION.to_string(),
            keywords: KEYWORDS.to_string(),
            assignment_duration_in_seconds: ASSIGNMENT_DURATION_SECS,
            auto_approval_delay_in_seconds: AUTO_APPROVAL_DELAY_SECS,
            reward: Price::usd(amount),
        },
        question: escape_question(&raw),
        max_assignments: MAX_ASSIGNMENTS,
        lifetime_in_seconds: LIFETIME_SECS,
    })
}

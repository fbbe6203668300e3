use serde::Deserialize;

/// One entry of the term-calendar API response (a JSON array of these).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermRecord {
    pub name: String,
    pub term_begin_date: String,
    pub term_end_date: String,
}

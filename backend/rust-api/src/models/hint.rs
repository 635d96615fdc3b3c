use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HintResponse {
    pub index: usize,
    pub faq: String,
    pub answer_text: String,
    pub reference_id: String,
}

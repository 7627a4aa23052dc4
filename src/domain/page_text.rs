/// Extracted text of one document page. Page numbers start at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

impl PageText {
    pub fn new(number: u32, text: String) -> Self {
        Self { number, text }
    }
}

use crate::domain::BookResult;

pub struct BookResultView {
    pub text: String,
    pub link: Option<String>,
    pub rating: Option<String>,
}

impl From<BookResult> for BookResultView {
    fn from(result: BookResult) -> Self {
        Self {
            text: result.text,
            link: result.link,
            rating: result.rating,
        }
    }
}

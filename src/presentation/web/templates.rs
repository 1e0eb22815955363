use askama::Template;

use super::views::BookResultView;

#[derive(Template)]
#[template(path = "pages/upload.html")]
pub struct UploadTemplate;

#[derive(Template)]
#[template(path = "partials/results.html")]
pub struct ResultsTemplate<'a> {
    pub retailer_name: &'a str,
    pub books: Vec<BookResultView>,
}

pub fn render_template<T: Template>(template: T) -> Result<String, askama::Error> {
    template.render()
}

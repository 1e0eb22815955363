pub mod ai;
pub mod html;
pub mod ocr;
pub mod retail;

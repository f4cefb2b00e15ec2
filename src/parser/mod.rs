pub mod answer;
pub mod body;
pub mod result_item;

pub use answer::first_answer_html;
pub use body::{extract_body, Fragment};
pub use result_item::{parse_result_item, parse_results};

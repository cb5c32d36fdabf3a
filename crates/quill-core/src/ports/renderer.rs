/// Converts raw authoring text into the HTML stored in `Post::content`.
pub trait ContentRenderer: Send + Sync {
    fn render(&self, source: &str) -> String;
}

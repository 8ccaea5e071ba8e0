/// Port for changing the current location, like a browser's history.
pub trait Navigator: Send + Sync {
    fn navigate(&self, to: &str);

    fn current(&self) -> String;
}

pub(crate) async fn healthz() -> &'static str {
    "ok"
}

use axum::response::Html;

// static placeholder page
pub async fn root() -> Html<&'static str> {
    Html("<h1>Code Challenge</h1>")
}

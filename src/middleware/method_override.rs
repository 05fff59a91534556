//! HTML 폼은 GET/POST만 보낼 수 있으므로, `POST /content/{id}?_method=PUT`처럼
//! 쿼리 문자열의 `_method`로 실제 메서드를 지정합니다. 라우팅보다 먼저 실행되어야 합니다.

use axum::{
    extract::Request,
    http::Method,
    middleware::Next,
    response::Response,
};

pub async fn method_override(mut request: Request, next: Next) -> Response {
    if request.method() == Method::POST {
        if let Some(method) = override_method(request.uri().query()) {
            tracing::trace!(%method, path = %request.uri().path(), "method override");
            *request.method_mut() = method;
        }
    }
    next.run(request).await
}

fn override_method(query: Option<&str>) -> Option<Method> {
    let query = query?;
    let (_, value) = url::form_urlencoded::parse(query.as_bytes()).find(|(key, _)| key == "_method")?;

    match value.to_ascii_uppercase().as_str() {
        "PUT" => Some(Method::PUT),
        "PATCH" => Some(Method::PATCH),
        "DELETE" => Some(Method::DELETE),
        _ => None,
    }
}

//! Local stand-in for the journal origin. Serves article pages for a fixed
//! range of numbers and the site's not-found marker page for everything
//! else, on an ephemeral port.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;

use crate::fetcher::NOT_FOUND_MARKER;

pub fn article_page(number: u32) -> String {
    format!(
        r#"<html><body>
<div class="contents">
  <div class="articleCon">
    <h3 class="tit_ko">지역사회 영양 연구 제{number}호 조사 보고</h3>
    <h4 class="link-target">초록</h4>
    <dd>본 연구는 제{number}호 조사에서 성인 300명의 영양 섭취 실태를 분석하였다.</dd>
    <h4 class="link-target">결론</h4>
    <dd>지역 맞춤형 영양 교육 프로그램이 필요한 것으로 나타났다.</dd>
  </div>
</div>
</body></html>"#
    )
}

pub fn missing_page() -> String {
    format!("<html><body><div class=\"error\">{NOT_FOUND_MARKER}.</div></body></html>")
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/journal/view.php")
}

/// Origin serving valid pages for `valid` numbers; returns the base URL for
/// a `Fetcher`.
pub async fn spawn(valid: RangeInclusive<u32>) -> String {
    let app = Router::new().route(
        "/journal/view.php",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let valid = valid.clone();
            async move {
                let number = params.get("number").and_then(|n| n.parse::<u32>().ok());
                match number {
                    Some(n) if valid.contains(&n) => Html(article_page(n)),
                    _ => Html(missing_page()),
                }
            }
        }),
    );
    serve(app).await
}

/// Origin that answers every request with a server error.
pub async fn spawn_erroring() -> String {
    let app = Router::new().route(
        "/journal/view.php",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    serve(app).await
}

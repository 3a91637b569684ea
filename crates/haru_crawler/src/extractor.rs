use scraper::{ElementRef, Html, Selector};

use haru_core::{Error, ExtractionFailure, Result};

/// Korean title first, English title second; first non-trivial match wins.
const TITLE_SELECTORS: &[&str] = &[".tit_ko", ".tit"];

/// Titles at or below this many characters are noise, not real titles.
const MIN_TITLE_CHARS: usize = 5;

const BODY_CONTAINER_SELECTOR: &str = "div.contents div.articleCon";
const SECTION_HEADER_SELECTOR: &str = "h4.link-target";

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedArticle {
    pub title: String,
    pub body: String,
}

/// Pull title and body sections out of an article page. A page without the
/// expected layout is not an article; there is deliberately no fallback to
/// other regions of the page.
pub fn extract(html: &str) -> Result<ExtractedArticle> {
    let document = Html::parse_document(html);

    let title =
        find_title(&document).ok_or(Error::NotAnArticle(ExtractionFailure::TitleMissing))?;

    let container_selector = Selector::parse(BODY_CONTAINER_SELECTOR).unwrap();
    let container = document
        .select(&container_selector)
        .next()
        .ok_or(Error::NotAnArticle(ExtractionFailure::BodyContainerMissing))?;

    let header_selector = Selector::parse(SECTION_HEADER_SELECTOR).unwrap();
    let mut sections = Vec::new();
    for header in container.select(&header_selector) {
        let heading = element_text(header);
        if let Some(data) = next_sibling_dd(header) {
            sections.push(format!("[{}]\n{}", heading, element_text(data)));
        }
    }

    let body = sections.join("\n\n");
    if body.is_empty() {
        return Err(Error::NotAnArticle(ExtractionFailure::BodyEmpty));
    }

    Ok(ExtractedArticle { title, body })
}

fn find_title(document: &Html) -> Option<String> {
    for raw in TITLE_SELECTORS {
        let selector = Selector::parse(raw).unwrap();
        if let Some(element) = document.select(&selector).next() {
            let text = element_text(element);
            if text.chars().count() > MIN_TITLE_CHARS {
                return Some(text);
            }
        }
    }
    None
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Headers pair with data blocks by document-order adjacency, not by
/// attributes: the matching block is the next `<dd>` sibling.
fn next_sibling_dd(header: ElementRef<'_>) -> Option<ElementRef<'_>> {
    header
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "dd")
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_PAGE: &str = r#"
        <html><body>
        <div class="contents">
          <div class="articleCon">
            <h3 class="tit_ko">지역사회 영양 섭취 실태에 대한 조사 보고</h3>
            <h4 class="link-target">초록</h4>
            <dd>성인 300명을 대상으로 영양 섭취 실태를 조사하였다.</dd>
            <h4 class="link-target">결론</h4>
            <dd>맞춤형 영양 교육이 필요한 것으로 나타났다.</dd>
          </div>
        </div>
        </body></html>
    "#;

    #[test]
    fn extracts_title_and_labeled_sections() {
        let article = extract(VALID_PAGE).unwrap();
        assert_eq!(article.title, "지역사회 영양 섭취 실태에 대한 조사 보고");
        assert!(article.body.starts_with("[초록]\n성인 300명"));
        assert!(article.body.contains("\n\n[결론]\n"));
    }

    #[test]
    fn korean_title_takes_priority_over_english() {
        let html = r#"
            <div class="tit">An English Title For The Article</div>
            <div class="tit_ko">한국어 제목이 우선한다</div>
            <div class="contents"><div class="articleCon">
              <h4 class="link-target">초록</h4><dd>본문.</dd>
            </div></div>
        "#;
        let article = extract(html).unwrap();
        assert_eq!(article.title, "한국어 제목이 우선한다");
    }

    #[test]
    fn short_korean_title_falls_through_to_english() {
        let html = r#"
            <div class="tit_ko">짧음</div>
            <div class="tit">Dietary patterns among Korean adults</div>
            <div class="contents"><div class="articleCon">
              <h4 class="link-target">Abstract</h4><dd>Body text.</dd>
            </div></div>
        "#;
        let article = extract(html).unwrap();
        assert_eq!(article.title, "Dietary patterns among Korean adults");
    }

    #[test]
    fn missing_title_is_a_distinct_failure() {
        let html = r#"<div class="contents"><div class="articleCon">
            <h4 class="link-target">초록</h4><dd>본문.</dd>
        </div></div>"#;
        let err = extract(html).unwrap_err();
        assert!(matches!(
            err,
            Error::NotAnArticle(ExtractionFailure::TitleMissing)
        ));
    }

    #[test]
    fn missing_container_is_a_distinct_failure() {
        let html = r#"<div class="tit_ko">지역사회 영양 섭취 실태 조사</div><p>loose text</p>"#;
        let err = extract(html).unwrap_err();
        assert!(matches!(
            err,
            Error::NotAnArticle(ExtractionFailure::BodyContainerMissing)
        ));
    }

    #[test]
    fn container_without_sections_is_an_empty_body() {
        let html = r#"
            <div class="tit_ko">지역사회 영양 섭취 실태 조사</div>
            <div class="contents"><div class="articleCon"><p>no headers here</p></div></div>
        "#;
        let err = extract(html).unwrap_err();
        assert!(matches!(
            err,
            Error::NotAnArticle(ExtractionFailure::BodyEmpty)
        ));
    }

    #[test]
    fn header_without_data_block_is_skipped() {
        let html = r#"
            <div class="tit_ko">지역사회 영양 섭취 실태 조사</div>
            <div class="contents"><div class="articleCon">
              <h4 class="link-target">초록</h4>
              <dd>본문이 있다.</dd>
              <h4 class="link-target">고아 섹션</h4>
            </div></div>
        "#;
        let article = extract(html).unwrap();
        assert_eq!(article.body, "[초록]\n본문이 있다.");
    }

    #[test]
    fn not_found_page_fails_extraction() {
        let html = format!(
            "<html><body><div class=\"error\">{}.</div></body></html>",
            crate::fetcher::NOT_FOUND_MARKER
        );
        assert!(extract(&html).is_err());
    }
}

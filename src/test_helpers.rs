use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{CraigslistError, Result};
use crate::ports::classifier::{ClassificationRequest, TextClassifier};
use crate::ports::page_source::{FetchedPage, PageSource};

/// Pieces of a listing detail page. `None` leaves the element out.
pub struct ListingHtml<'a> {
    pub canonical_url: Option<&'a str>,
    pub price: Option<&'a str>,
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub attr_spans: Vec<&'a str>,
    pub thumbs: Vec<&'a str>,
}

impl Default for ListingHtml<'_> {
    fn default() -> Self {
        Self {
            canonical_url: Some(
                "https://sfbay.craigslist.org/sfc/apa/d/san-francisco-sunny/7812345678.html",
            ),
            price: Some("$3,200"),
            title: Some("Sunny one bedroom near the panhandle"),
            description: Some(
                "Bright one bedroom with bay windows, available June 1, 2024. \
                 12 month lease, unfurnished. There is a $45 application fee.",
            ),
            attr_spans: vec![
                "<b>1BR</b> / <b>1Ba</b>",
                "cats are ok - purrr",
                "laundry: w/d in unit",
                "parking: street parking",
            ],
            thumbs: vec![
                "https://images.craigslist.org/00a0a_1_600x450.jpg",
                "https://images.craigslist.org/00b0b_2_600x450.jpg",
            ],
        }
    }
}

impl ListingHtml<'_> {
    pub fn render(&self) -> String {
        let mut html = String::from("<!DOCTYPE html><html><head>");
        if let Some(url) = self.canonical_url {
            let _ = write!(html, r#"<meta property="og:url" content="{url}">"#);
        }
        html.push_str(r#"<meta property="og:title" content="listing"></head><body>"#);

        html.push_str(r#"<h1 class="postingtitle"><span class="postingtitletext">"#);
        if let Some(title) = self.title {
            let _ = write!(html, r#"<span id="titletextonly">{title}</span> "#);
        }
        if let Some(price) = self.price {
            let _ = write!(html, r#"<span class="price">{price}</span>"#);
        }
        html.push_str("</span></h1>");

        html.push_str(r#"<div id="thumbs">"#);
        for thumb in &self.thumbs {
            let _ = write!(html, r#"<a class="thumb" href="{thumb}"><img src="{thumb}"></a>"#);
        }
        html.push_str("</div>");

        html.push_str(r#"<div class="mapAndAttrs"><p class="attrgroup">"#);
        for span in &self.attr_spans {
            let _ = write!(html, "<span>{span}</span><br>");
        }
        html.push_str("</p></div>");

        if let Some(description) = self.description {
            let _ = write!(
                html,
                r#"<section id="postingbody"><div class="print-information print-qrcode-container"><p class="print-qrcode-label">QR Code Link to This Post</p></div>{description}</section>"#
            );
        }
        html.push_str("</body></html>");
        html
    }
}

pub fn listing_html() -> String {
    ListingHtml::default().render()
}

pub fn search_results_html(urls: &[&str]) -> String {
    let mut html = String::from(
        r#"<!DOCTYPE html><html><body><div class="cl-search-results"><ol class="cl-static-search-results">"#,
    );
    for (idx, url) in urls.iter().enumerate() {
        let _ = write!(
            html,
            r#"<li class="cl-static-search-result" title="listing {idx}"><a href="{url}"><div class="title">listing {idx}</div><div class="price">$3,000</div></a></li>"#
        );
    }
    html.push_str("</ol></div></body></html>");
    html
}

/// Serves canned pages by url. Unknown urls fail like a refused connection.
#[derive(Default)]
pub struct MockPageSource {
    pages: HashMap<String, FetchedPage>,
    requests: Mutex<Vec<String>>,
}

impl MockPageSource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(mut self, url: &str, status: u16, body: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchedPage {
                status,
                body: body.to_string(),
            },
        );
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for MockPageSource {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned().ok_or_else(|| {
            CraigslistError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                format!("no page for {url}"),
            ))
        })
    }
}

/// Answers classification requests by schema name. Schemas without an
/// answer, or marked failing, return a service error.
#[derive(Default)]
pub struct MockClassifier {
    answers: HashMap<String, serde_json::Value>,
    failing: HashSet<String>,
    calls: Mutex<Vec<ClassificationRequest>>,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_answer(mut self, schema_name: &str, answer: serde_json::Value) -> Self {
        self.answers.insert(schema_name.to_string(), answer);
        self
    }

    #[must_use]
    pub fn failing(mut self, schema_name: &str) -> Self {
        self.failing.insert(schema_name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<ClassificationRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextClassifier for MockClassifier {
    async fn classify(&self, request: &ClassificationRequest) -> Result<serde_json::Value> {
        self.calls.lock().unwrap().push(request.clone());
        if self.failing.contains(&request.schema_name) {
            return Err(CraigslistError::ModelService {
                reason: format!("{} unavailable", request.schema_name),
            });
        }
        self.answers
            .get(&request.schema_name)
            .cloned()
            .ok_or_else(|| CraigslistError::ModelService {
                reason: format!("no answer for {}", request.schema_name),
            })
    }
}

use std::sync::Arc;

use shelfscan::domain::{BookLookup, LookupError};
use shelfscan::infrastructure::retail::{RatedLookup, RetailSearchLookup, SearchEngineLookup};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

fn encode(url: &str) -> String {
    url.replace(':', "%3A").replace('/', "%2F")
}

async fn rated_lookup(server: &MockServer) -> RatedLookup {
    let client = reqwest::Client::new();
    let search = SearchEngineLookup::new(
        client.clone(),
        &format!("{}/html/", server.uri()),
        &server.uri(),
    )
    .unwrap();
    RatedLookup::new(Arc::new(search), client)
}

async fn mount_search_hit(server: &MockServer, query: &str, product_path: &str) -> String {
    let product = format!("{}{product_path}", server.uri());
    let body = format!(
        r#"<a href="/html/?q=site%3A127.0.0.1+{query}">again</a>
           <a class="result__a" href="//duckduckgo.com/l/?uddg={}&amp;rut=x">hit</a>"#,
        encode(&product)
    );
    Mock::given(method("GET"))
        .and(path("/html/"))
        .and(query_param("q", format!("site:127.0.0.1 {query}").as_str()))
        .respond_with(html(&body))
        .mount(server)
        .await;
    product
}

#[tokio::test]
async fn retail_search_takes_first_product_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", "Dune - Frank Herbert"))
        .and(header("user-agent", "Mozilla/5.0"))
        .respond_with(html(
            r#"<a class="a-link-normal" href="/gp/help">help</a>
               <a class="a-link-normal s-no-outline" href="/Dune/dp/0441013597?ref=sr_1_1">Dune</a>
               <a class="a-link-normal s-no-outline" href="/Dune-Messiah/dp/0593098234">Messiah</a>"#,
        ))
        .mount(&server)
        .await;

    let lookup = RetailSearchLookup::new(reqwest::Client::new(), &server.uri()).unwrap();
    let result = lookup.lookup("Dune - Frank Herbert").await.unwrap();

    assert_eq!(
        result.link,
        Some(format!("{}/Dune/dp/0441013597?ref=sr_1_1", server.uri()))
    );
    assert!(result.rating.is_none());
}

#[tokio::test]
async fn retail_search_without_results_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(html("<div>No results for your search.</div>"))
        .mount(&server)
        .await;

    let lookup = RetailSearchLookup::new(reqwest::Client::new(), &server.uri()).unwrap();
    let result = lookup.lookup("Nothing").await.unwrap();

    assert!(result.link.is_none());
}

#[tokio::test]
async fn retail_search_error_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let lookup = RetailSearchLookup::new(reqwest::Client::new(), &server.uri()).unwrap();
    let err = lookup.lookup("Dune").await.unwrap_err();

    assert!(matches!(err, LookupError::Status(503)));
}

#[tokio::test]
async fn rated_lookup_reads_rating_from_product_page() {
    let server = MockServer::start().await;
    let product = mount_search_hit(&server, "Emma", "/Emma/dp/1").await;
    Mock::given(method("GET"))
        .and(path("/Emma/dp/1"))
        .respond_with(html(r#"<span class="a-icon-alt">4.5 out of 5 stars</span>"#))
        .mount(&server)
        .await;

    let result = rated_lookup(&server).await.lookup("Emma").await.unwrap();

    assert_eq!(result.link.as_deref(), Some(product.as_str()));
    assert_eq!(result.rating.as_deref(), Some("4.5 out of 5 stars"));
}

#[tokio::test]
async fn rated_lookup_reads_rating_nested_in_popover_markup() {
    let server = MockServer::start().await;
    mount_search_hit(&server, "Emma", "/Emma/dp/1").await;
    Mock::given(method("GET"))
        .and(path("/Emma/dp/1"))
        .respond_with(html(
            r#"<div id="averageCustomerReviews">
                 <span id="acrPopover" class="reviewCountTextLinkedHistogram" title="4.6 out of 5 stars">
                   <span class="a-declarative"><a href="javascript:void(0)" class="a-popover-trigger">
                     <i class="a-icon a-icon-star a-star-4-5"><span class="a-icon-alt">4.6 out of 5 stars</span></i>
                   </a></span>
                 </span>
               </div>"#,
        ))
        .mount(&server)
        .await;

    let result = rated_lookup(&server).await.lookup("Emma").await.unwrap();

    assert_eq!(result.rating.as_deref(), Some("4.6 out of 5 stars"));
}

#[tokio::test]
async fn rated_lookup_without_rating_element_says_no_rating() {
    let server = MockServer::start().await;
    mount_search_hit(&server, "Emma", "/Emma/dp/1").await;
    Mock::given(method("GET"))
        .and(path("/Emma/dp/1"))
        .respond_with(html("<h1>Emma</h1>"))
        .mount(&server)
        .await;

    let result = rated_lookup(&server).await.lookup("Emma").await.unwrap();

    assert!(result.link.is_some());
    assert_eq!(result.rating.as_deref(), Some("No rating"));
}

#[tokio::test]
async fn rated_lookup_keeps_link_when_product_page_fails() {
    let server = MockServer::start().await;
    mount_search_hit(&server, "Emma", "/Emma/dp/1").await;
    Mock::given(method("GET"))
        .and(path("/Emma/dp/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = rated_lookup(&server).await.lookup("Emma").await.unwrap();

    assert!(result.link.is_some());
    assert_eq!(result.rating.as_deref(), Some("Error fetching rating"));
}

#[tokio::test]
async fn rated_lookup_skips_rating_when_nothing_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html/"))
        .respond_with(html("<p>nothing</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let result = rated_lookup(&server).await.lookup("Emma").await.unwrap();

    assert!(result.link.is_none());
    assert!(result.rating.is_none());
}

#[tokio::test]
async fn search_engine_failure_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html/"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = rated_lookup(&server).await.lookup("Emma").await.unwrap_err();

    assert!(matches!(err, LookupError::Status(429)));
}

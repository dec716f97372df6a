//! Integration tests for outreach-browser
//!
//! These tests require Chrome to be installed and available.
//! Run with: cargo test --test integration -- --ignored

use outreach_browser::{BrowserOptions, BrowserSession, Error, LeadSearch, Network, SiteProfile};
use outreach_contacts::Person;
use std::time::Duration;

fn chrome_available() -> bool {
    eoka::stealth::patcher::find_chrome().is_ok()
}

async fn session_with(html: &str) -> BrowserSession {
    let session = BrowserSession::launch(&BrowserOptions::default().headless(true))
        .await
        .expect("Failed to launch browser");
    session
        .goto(&format!("data:text/html,{}", html))
        .await
        .expect("Failed to navigate");
    session
}

async fn headless() -> BrowserSession {
    BrowserSession::launch(&BrowserOptions::default().headless(true))
        .await
        .expect("Failed to launch browser")
}

/// A `data:` URL for `html`, percent-encoded so the browser reports it back
/// unchanged.
fn data_url(html: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(html.as_bytes()).collect();
    format!("data:text/html,{}", encoded.replace('+', "%20"))
}

fn list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_selector_fallbacks() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let session = session_with(r#"<div class="b">one</div><div class="b">two</div>"#).await;

    assert_eq!(session.count(".b").await.unwrap(), 2);
    assert_eq!(session.count("[[[").await.unwrap(), 0);
    assert_eq!(
        session
            .first_present(&list(&[".a", ".b"]))
            .await
            .unwrap()
            .as_deref(),
        Some(".b")
    );
    assert_eq!(session.texts(".b").await.unwrap(), vec!["one", "two"]);

    session.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_mark_and_query_cards() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let session = session_with(
        r#"
        <div class="card"><a href="https://example.com/in/jane"><span>Jane Doe</span></a></div>
        <div class="card"><a href="https://example.com/in/bob"><span>Bob Roe</span></a></div>
    "#,
    )
    .await;

    let marked = session
        .mark_all(&list(&[".missing", ".card"]), "data-card")
        .await
        .unwrap();
    assert_eq!(marked, 2);

    let name = session
        .text_in("[data-card=\"1\"]", &list(&["span"]))
        .await
        .unwrap();
    assert_eq!(name.as_deref(), Some("Bob Roe"));

    let href = session
        .attr_in("[data-card=\"0\"]", &list(&["a"]), "href")
        .await
        .unwrap();
    assert_eq!(href.as_deref(), Some("https://example.com/in/jane"));

    session.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_find_by_label_and_click() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let session = session_with(
        r#"
        <button disabled>Connect</button>
        <button aria-label="Invite Jane to connect" onclick="document.title='clicked'">Invite</button>
        <div role="button">More</div>
    "#,
    )
    .await;

    let target = session
        .find_by_label(None, "button, [role='button']", &list(&["connect"]))
        .await
        .unwrap()
        .expect("enabled connect button");
    session.click(&target).await.unwrap();
    let title: String = session.page().evaluate("document.title").await.unwrap();
    assert_eq!(title, "clicked");

    let none = session
        .find_by_label(None, "button", &list(&["withdraw"]))
        .await
        .unwrap();
    assert!(none.is_none());

    assert!(session.click("#nope").await.is_err());

    session.close().await.expect("Failed to close browser");
}

// Lead search

/// Final state of a finished search, used as the results page.
const LEADS_DONE: &str = r#"
    <input name="company"><button type="submit">Search</button>
    <div id="out">
        <span class="addr">jane.doe@acme.io</span>
        <span class="addr">bob.roe@acme.io</span>
        <span class="addr">support@acme.io</span>
    </div>
"#;

fn lead_search(search_html: &str, results_html: &str, emails_timeout: u64) -> LeadSearch {
    let yaml = format!(
        r#"
name: test-leads
login_url: "about:blank"
urls:
  search: "{search}"
  results: "{results}"
selectors:
  search_input: ["input[name='company']"]
  submit: [".missing-button", "button[type='submit']"]
  results: [".addr", "p.addr-list"]
  emails: [".missing", ".addr", "p"]
markers:
  busy: ["Searching..."]
  done: ["emails found"]
  empty: ["No emails found"]
  login_page: ["login"]
timings:
  input_timeout: 3000
  login_wait: 500
  login_poll: 100
  results_timeout: 5000
  settle: 100
  emails_timeout: {emails_timeout}
  poll: 100
limits:
  min_emails: 2
"#,
        search = data_url(search_html),
        results = data_url(results_html),
        emails_timeout = emails_timeout,
    );
    LeadSearch::new(SiteProfile::parse(&yaml).expect("profile parses")).expect("profile is complete")
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_find_emails_waits_out_busy_marker() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    // Stays busy (with an empty result placeholder) for 1.5s, longer than the
    // address wait, so only the busy wait gets the flow to the real results.
    let page = r#"
        <input name="company">
        <button type="submit" onclick="run()">Search</button>
        <div id="out"></div>
        <script>
        function run() {
            const d = document.querySelector("input[name='company']").value;
            const out = document.getElementById('out');
            out.innerHTML = '<span class="addr"></span>' + 'Search' + 'ing...';
            setTimeout(function () {
                out.innerHTML = ['Jane.Doe', 'bob.roe', 'support']
                    .map(function (n) { return '<span class="addr">' + [n, d].join('@') + '</span>'; })
                    .join('');
            }, 1500);
        }
        </script>
    "#;
    let search = lead_search(page, LEADS_DONE, 300);

    let session = headless().await;
    let emails = search.find_emails(&session, "acme.io").await.unwrap();
    assert_eq!(
        emails,
        vec!["jane.doe@acme.io", "bob.roe@acme.io", "support@acme.io"]
    );

    session.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_find_emails_waits_for_address_threshold() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    // Two addresses at once, the third a moment later.
    let page = r#"
        <input name="company"><button type="submit">Search</button>
        <div id="out">
            <span class="addr">jane.doe@acme.io</span>
            <span class="addr">bob.roe@acme.io</span>
        </div>
        <script>
        setTimeout(function () {
            const s = document.createElement('span');
            s.className = 'addr';
            s.textContent = ['support', 'acme.io'].join('@');
            document.getElementById('out').appendChild(s);
        }, 1500);
        </script>
    "#;
    let search = lead_search(page, LEADS_DONE, 5000);

    let session = headless().await;
    let emails = search.find_emails(&session, "acme.io").await.unwrap();
    assert_eq!(emails.len(), 3);
    assert!(emails.contains(&"support@acme.io".to_string()));

    session.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_find_emails_falls_back_to_page_scan() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    // No element holds exactly one address.
    let page = r#"
        <input name="company"><button type="submit">Search</button>
        <p class="addr-list">Team: Jane.Doe@acme.io, bob.roe@acme.io and sam.lee@acme.io</p>
        <p>3 emails found</p>
    "#;
    let search = lead_search(page, page, 5000);

    let session = headless().await;
    let emails = search.find_emails(&session, "acme.io").await.unwrap();
    assert_eq!(
        emails,
        vec!["jane.doe@acme.io", "bob.roe@acme.io", "sam.lee@acme.io"]
    );

    session.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_find_emails_stops_on_empty_marker() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let page = r#"
        <input name="company"><button type="submit">Search</button>
        <p class="addr-list">No emails found</p>
    "#;
    let search = lead_search(page, page, 60_000);

    let session = headless().await;
    let emails = tokio::time::timeout(
        Duration::from_secs(20),
        search.find_emails(&session, "acme.io"),
    )
    .await
    .expect("empty marker should end the address wait")
    .unwrap();
    assert!(emails.is_empty());

    session.close().await.expect("Failed to close browser");
}

// Network

const INVITE_JS: &str = r#"
    <script>
    function invite() {
        const d = document.createElement('div');
        d.setAttribute('role', 'dialog');
        d.innerHTML = '<button onclick="sent()">Send now</button>';
        document.body.appendChild(d);
    }
    function sent() { document.body.append('Invitation ' + 'sent'); }
    function menu() {
        const m = document.createElement('div');
        m.className = 'menu';
        m.innerHTML = '<div role="button" aria-label="Invite to connect" onclick="invite()">Connect</div>';
        document.body.appendChild(m);
    }
    </script>
"#;

/// One result card per connect path: direct button, Message only (connect
/// from the profile page), and the More menu.
fn network_search_page() -> String {
    let profile = data_url(&format!(
        r#"<h1>Bob Roe</h1><button onclick="invite()">Connect</button>{}"#,
        INVITE_JS
    ));
    let cards = r#"
        <div class="results">
            <div class="card"><span class="name">Jane Doe</span>
                <button onclick="invite()">Connect</button></div>
            <div class="card"><span class="name">Bob Roe</span>
                <a class="profile" href="PROFILE_URL">View</a><button>Message</button></div>
            <div class="card"><span class="name">Sam Lee</span>
                <button onclick="menu()">More</button></div>
        </div>
    "#
    .replace("PROFILE_URL", &profile);
    format!("{}{}", cards, INVITE_JS)
}

fn network(home_html: &str, login_wait: u64) -> Network {
    let yaml = format!(
        r#"
name: test-network
login_url: "about:blank"
urls:
  home: "{home}"
  search: "{search}"
selectors:
  results: [".results"]
  cards: [".missing-card", ".card"]
  card_name: [".name"]
  card_link: ["a.profile"]
  dropdown_connect: [".menu [aria-label*='connect' i]"]
  dropdown_items: [".menu div[role='button']"]
  modal: ["[role='dialog']"]
  dismiss: [".dismiss"]
markers:
  connect: ["Connect"]
  message: ["Message"]
  more: ["More"]
  send: ["Send"]
  sent: ["Invitation sent"]
  logged_in_url: ["/feed"]
  logged_in_page: ["signed-in-as"]
timings:
  page_settle: 100
  results_timeout: 2000
  modal_timeout: 2000
  action_delay: 100
  connection_delay: 0
  search_delay: 0
  login_wait: {login_wait}
  login_poll: 100
limits:
  max_people: 10
  cards_checked: 5
"#,
        home = data_url(home_html),
        search = data_url(&network_search_page()),
        login_wait = login_wait,
    );
    Network::new(SiteProfile::parse(&yaml).expect("profile parses")).expect("profile is complete")
}

fn people(emails: &[&str]) -> Vec<Person> {
    emails.iter().map(|e| Person::from_email(*e)).collect()
}

const SIGNED_IN: &str = r#"<div id="nav">signed-in-as tester</div>"#;

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_reach_uses_every_connect_path() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let network = network(SIGNED_IN, 500);
    let targets = people(&[
        "jane.doe@acme.io",
        "ab@acme.io",
        "bob.roe@acme.io",
        "sam.lee@acme.io",
        "max.payne@acme.io",
    ]);

    let session = headless().await;
    let outcomes = network.reach(&session, &targets, "Acme", 5).await.unwrap();

    // "ab" has no searchable name and Max Payne has no card
    let names: Vec<&str> = outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["Jane Doe", "Bob Roe", "Sam Lee"]);
    assert!(outcomes.iter().all(|o| o.connected));
    assert!(outcomes[1]
        .profile_url
        .as_deref()
        .is_some_and(|u| u.starts_with("data:text/html")));
    assert_eq!(outcomes[0].email, "jane.doe@acme.io");

    session.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_reach_stops_at_max_connections() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let network = network(SIGNED_IN, 500);
    let targets = people(&[
        "jane.doe@acme.io",
        "ab@acme.io",
        "bob.roe@acme.io",
        "sam.lee@acme.io",
    ]);

    let session = headless().await;
    let outcomes = network.reach(&session, &targets, "Acme", 2).await.unwrap();

    let connected = outcomes.iter().filter(|o| o.connected).count();
    assert_eq!(connected, 2);
    let emails: Vec<&str> = outcomes.iter().map(|o| o.email.as_str()).collect();
    assert_eq!(emails, vec!["jane.doe@acme.io", "bob.roe@acme.io"]);

    session.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_reach_requires_login() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let network = network(r#"<a href="about:blank">Sign in</a>"#, 300);
    let session = headless().await;
    let err = network
        .reach(&session, &people(&["jane.doe@acme.io"]), "Acme", 5)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::LoginRequired(ref name) if name == "test-network"));

    session.close().await.expect("Failed to close browser");
}

use crate::profile::SiteProfile;
use crate::session::{BrowserOptions, BrowserSession};
use crate::{Error, Result};
use std::future::Future;
use tracing::info;

/// Open the site's login page in a visible browser, wait for `ready` (the
/// operator saying they are done) and save the session cookies.
///
/// Returns the number of cookies written to the jar.
pub async fn interactive_login<F>(
    profile: &SiteProfile,
    options: &BrowserOptions,
    ready: F,
) -> Result<usize>
where
    F: Future<Output = ()>,
{
    if options.cookie_jar.is_none() {
        return Err(Error::Config(format!(
            "{}: login needs a cookie jar to save into",
            profile.name
        )));
    }

    let options = options.clone().headless(false);
    let session = BrowserSession::launch(&options).await?;
    session.goto(&profile.login_url).await?;
    info!("Log in to {} in the browser window", profile.name);

    ready.await;

    let saved = session.save_cookies().await;
    session.close().await?;
    saved
}

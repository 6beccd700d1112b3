use crate::{
    api_client::{Api, Params},
    article::{self, Article, LIST_DATE_FORMAT, SEARCH_DATE_FORMAT},
    error::Error,
    readable::Document,
    settings::{Settings, SettingsStore},
};
use std::io::Write;

pub const DEFAULT_COUNT: u32 = 10;

/// Runs one authenticated command against an [`Api`], writing to `out`.
#[derive(Debug)]
pub struct Runner<A, W> {
    api: A,
    out: W,
}

impl<A: Api, W: Write> Runner<A, W> {
    pub fn new(api: A, out: W) -> Self {
        Self { api, out }
    }

    pub fn add(&mut self, url: &str) -> anyhow::Result<()> {
        let response = self.api.call("add", Params::new().with("url", url))?;
        if let Err(e) = response.into_result() {
            writeln!(self.out, "Unable to add url: {}", e)?;
        }
        Ok(())
    }

    pub fn list(
        &mut self,
        count: Option<u32>,
        since: Option<i64>,
        reverse: bool,
    ) -> anyhow::Result<()> {
        let params = Params::new()
            .with("count", count.unwrap_or(DEFAULT_COUNT))
            .with("since", since);

        let Some(mut articles) = self.fetch_articles(params)? else {
            return Ok(());
        };
        article::sort_by_time_added(&mut articles, reverse);

        for item in &articles {
            self.print_article(item, LIST_DATE_FORMAT)?;
        }
        Ok(())
    }

    pub fn read(&mut self, url: &str) -> anyhow::Result<()> {
        let page = match self.api.fetch(url)?.into_result() {
            Ok(page) => page,
            Err(e) => return self.report(e),
        };

        let document = Document::parse(page.body());
        writeln!(self.out, "{}", document.short_title())?;
        writeln!(self.out, "{}", document.summary())?;
        Ok(())
    }

    pub fn search(&mut self, query: &str) -> anyhow::Result<()> {
        let Some(mut articles) = self.fetch_articles(Params::new())? else {
            return Ok(());
        };
        article::sort_by_time_added(&mut articles, false);

        for item in article::search(&articles, query) {
            self.print_article(item, SEARCH_DATE_FORMAT)?;
        }
        Ok(())
    }

    pub fn limit(&mut self) -> anyhow::Result<()> {
        let response = match self.api.call("api", Params::new())?.into_result() {
            Ok(response) => response,
            Err(e) => return self.report(e),
        };
        for limit in response.rate_limits() {
            writeln!(self.out, "{}", limit)?;
        }
        Ok(())
    }

    /// `None` when the remote refused; its status line has been printed.
    fn fetch_articles(&mut self, params: Params) -> anyhow::Result<Option<Vec<Article>>> {
        match self.api.call("get", params)?.into_result() {
            Ok(response) => Ok(Some(response.articles()?)),
            Err(e) => {
                self.report(e)?;
                Ok(None)
            }
        }
    }

    fn print_article(&mut self, item: &Article, date_format: &str) -> anyhow::Result<()> {
        writeln!(
            self.out,
            "{} {} {}",
            item.time_added.format(date_format),
            item.title,
            item.url
        )?;
        Ok(())
    }

    fn report(&mut self, error: Error) -> anyhow::Result<()> {
        log::debug!("Remote refused request: {:?}", error);
        writeln!(self.out, "{}", error)?;
        Ok(())
    }
}

/// What the `settings` command did.
#[derive(Debug, PartialEq, Eq)]
pub enum SettingsOutcome {
    Shown,
    Saved,
    /// Nothing to save; the caller prints usage.
    NothingToDo,
}

pub fn settings(
    store: &SettingsStore,
    show: bool,
    updates: Settings,
    out: &mut impl Write,
) -> anyhow::Result<SettingsOutcome> {
    if show {
        let settings = store.load().unwrap_or_else(|_| Settings::scaffold());
        for (key, value) in settings.iter() {
            writeln!(out, "{}: {}", key, value)?;
        }
        return Ok(SettingsOutcome::Shown);
    }

    if updates.iter().all(|(_, value)| value.is_empty()) {
        return Ok(SettingsOutcome::NothingToDo);
    }

    store.save(updates)?;
    Ok(SettingsOutcome::Saved)
}

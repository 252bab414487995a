use newsdesk_core::model::validation::INVALID_CHOICE_MESSAGE;
use newsdesk_core::{
    Article, ArticleDraft, ArticleId, ArticlePage, ArticleService, ArticleServiceError,
    CatalogService, CatalogServiceError, ConfigError, DbError, NewsdeskConfig, RedactorId,
    RedactorService, RedactorServiceError, Registration, RepoError, SqliteArticleRepository,
    SqliteKeywordRepository, SqliteRedactorRepository, SqliteTopicRepository, TopicRef,
    ValidationErrors,
};
use rusqlite::Connection;
use std::fmt::{Display, Formatter};

/// CLI-level failure; only `Validation` maps to exit code 2.
#[derive(Debug)]
pub enum CliError {
    Validation(ValidationErrors),
    NotFound(String),
    Other(String),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "{errors}"),
            Self::NotFound(what) => write!(f, "{what} not found"),
            Self::Other(message) => write!(f, "{message}"),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Other(value.to_string())
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Other(value.to_string())
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Other(value.to_string())
    }
}

impl From<ArticleServiceError> for CliError {
    fn from(value: ArticleServiceError) -> Self {
        match value {
            ArticleServiceError::Validation(errors) => Self::Validation(errors),
            ArticleServiceError::ArticleNotFound(id) => Self::NotFound(format!("article {id}")),
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<RedactorServiceError> for CliError {
    fn from(value: RedactorServiceError) -> Self {
        match value {
            RedactorServiceError::Validation(errors) => Self::Validation(errors),
            RedactorServiceError::RedactorNotFound(id) => {
                Self::NotFound(format!("redactor {id}"))
            }
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<CatalogServiceError> for CliError {
    fn from(value: CatalogServiceError) -> Self {
        match value {
            CatalogServiceError::Validation(errors) => Self::Validation(errors),
            other => Self::Other(other.to_string()),
        }
    }
}

/// Article fields as typed on the command line; people are named by username.
pub struct ArticleInput {
    pub actor: String,
    pub title: String,
    pub content: String,
    pub topic: String,
    pub keywords: String,
    pub co_authors: Vec<String>,
}

/// Services bound to one open connection.
pub struct Desk<'conn> {
    articles: ArticleService<SqliteArticleRepository<'conn>>,
    redactors: RedactorService<SqliteRedactorRepository<'conn>>,
    catalog: CatalogService<SqliteTopicRepository<'conn>, SqliteKeywordRepository<'conn>>,
}

impl<'conn> Desk<'conn> {
    pub fn new(conn: &'conn Connection, config: &NewsdeskConfig) -> Result<Self, CliError> {
        Ok(Self {
            articles: ArticleService::new(SqliteArticleRepository::try_new(conn)?)
                .with_index_page_size(config.page_size),
            redactors: RedactorService::new(SqliteRedactorRepository::try_new(conn)?),
            catalog: CatalogService::new(
                SqliteTopicRepository::try_new(conn)?,
                SqliteKeywordRepository::try_new(conn)?,
            ),
        })
    }

    pub fn register(&self, registration: Registration) -> Result<(), CliError> {
        let redactor = self.redactors.register(registration)?;
        println!("{}\t{}", redactor.id, redactor.username);
        Ok(())
    }

    pub fn topic_add(&self, name: &str) -> Result<(), CliError> {
        let (topic, created) = self.catalog.ensure_topic(name)?;
        let state = if created { "created" } else { "exists" };
        println!("{}\t{}\t{}", topic.id, topic.name, state);
        Ok(())
    }

    pub fn article_create(&self, input: ArticleInput) -> Result<(), CliError> {
        let (actor, draft) = self.draft_from(input)?;
        let article = self.articles.create_article(actor, draft)?;
        print_article(&article);
        Ok(())
    }

    pub fn article_update(&self, id: ArticleId, input: ArticleInput) -> Result<(), CliError> {
        let (actor, draft) = self.draft_from(input)?;
        let article = self.articles.update_article(actor, id, draft)?;
        print_article(&article);
        Ok(())
    }

    pub fn article_delete(&self, id: ArticleId, actor: &str) -> Result<(), CliError> {
        let actor = self.actor_id(actor)?;
        self.articles.delete_article(actor, id)?;
        println!("deleted {id}");
        Ok(())
    }

    pub fn article_list(
        &self,
        category: Option<String>,
        query: Option<String>,
        author: Option<&str>,
        page: u32,
    ) -> Result<(), CliError> {
        let listing = match author {
            Some(username) => {
                let author_id = self.actor_id(username)?;
                self.articles.list_articles_by_author(author_id, page)?
            }
            None => self.articles.list_articles(category, query, page)?,
        };
        print_page(&listing);
        Ok(())
    }

    pub fn redactor_delete(&self, username: &str) -> Result<(), CliError> {
        let id = self.actor_id(username)?;
        let report = self.redactors.delete_redactor(id)?;
        println!(
            "deleted redactor {} with {} sole-authored article(s)",
            report.redactor_id,
            report.deleted_articles.len()
        );
        for article_id in &report.deleted_articles {
            println!("  {article_id}");
        }
        Ok(())
    }

    fn draft_from(&self, input: ArticleInput) -> Result<(RedactorId, ArticleDraft), CliError> {
        let actor = self.actor_id(&input.actor)?;
        let mut co_authors = Vec::with_capacity(input.co_authors.len());
        for username in &input.co_authors {
            match self.redactors.find_by_username(username)? {
                Some(redactor) => co_authors.push(redactor.id),
                None => {
                    return Err(CliError::Validation(ValidationErrors::single(
                        "authors",
                        INVALID_CHOICE_MESSAGE,
                    )))
                }
            }
        }
        let draft = ArticleDraft::new(input.title, input.content, TopicRef::Named(input.topic))
            .with_keywords(input.keywords)
            .with_authors(co_authors);
        Ok((actor, draft))
    }

    fn actor_id(&self, username: &str) -> Result<RedactorId, CliError> {
        self.redactors
            .find_by_username(username)?
            .map(|redactor| redactor.id)
            .ok_or_else(|| CliError::NotFound(format!("redactor `{username}`")))
    }
}

fn print_article(article: &Article) {
    let authors = article
        .authors
        .iter()
        .map(|author| author.username.as_str())
        .collect::<Vec<_>>()
        .join(",");
    println!(
        "{}\t{}\t{}\t{}\tkeywords={}\tauthors={}",
        article.id,
        article.published_date,
        article.topic.name,
        article.title,
        article.keyword_names().join(","),
        authors
    );
}

fn print_page(listing: &ArticlePage) {
    for article in &listing.items {
        print_article(article);
    }
    println!(
        "page {}/{} ({} total{})",
        listing.page,
        listing.page_count(),
        listing.total,
        if listing.has_next { ", more" } else { "" }
    );
}

#[cfg(test)]
mod tests {
    use super::{ArticleInput, CliError, Desk};
    use newsdesk_core::{open_db_in_memory, NewsdeskConfig, Registration};

    fn input(actor: &str, title: &str, co_authors: &[&str]) -> ArticleInput {
        ArticleInput {
            actor: actor.to_string(),
            title: title.to_string(),
            content: "Body".to_string(),
            topic: "Tech".to_string(),
            keywords: "ai, tech".to_string(),
            co_authors: co_authors.iter().map(|name| name.to_string()).collect(),
        }
    }

    fn register(desk: &Desk<'_>, username: &str) {
        desk.register(Registration {
            username: username.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            years_of_experience: None,
            password1: "secret-pass".to_string(),
            password2: "secret-pass".to_string(),
        })
        .unwrap();
    }

    #[test]
    fn duplicate_title_surfaces_as_validation_error() {
        let conn = open_db_in_memory().unwrap();
        let desk = Desk::new(&conn, &NewsdeskConfig::default()).unwrap();
        register(&desk, "ada");

        desk.article_create(input("ada", "AI Update", &[])).unwrap();
        match desk.article_create(input("ada", "AI Update", &[])) {
            Err(CliError::Validation(errors)) => assert!(errors.has_field("title")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn unknown_usernames_are_reported() {
        let conn = open_db_in_memory().unwrap();
        let desk = Desk::new(&conn, &NewsdeskConfig::default()).unwrap();
        register(&desk, "ada");

        assert!(matches!(
            desk.article_create(input("nobody", "Title", &[])),
            Err(CliError::NotFound(_))
        ));
        match desk.article_create(input("ada", "Title", &["ghost"])) {
            Err(CliError::Validation(errors)) => assert!(errors.has_field("authors")),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            desk.redactor_delete("ghost"),
            Err(CliError::NotFound(_))
        ));
    }
}

mod common;

use common::{count_rows, seed_redactor};
use newsdesk_core::db::open_db_in_memory;
use newsdesk_core::model::validation::{DUPLICATE_TITLE_MESSAGE, INVALID_CHOICE_MESSAGE};
use newsdesk_core::{
    ArticleDraft, ArticleRepository, ArticleService, ArticleServiceError, RepoError,
    SqliteArticleRepository, TopicRef,
};
use rusqlite::params;
use uuid::Uuid;

fn draft(title: &str, keywords: &str) -> ArticleDraft {
    ArticleDraft::new(title, "Body text", TopicRef::Named("Tech".to_string()))
        .with_keywords(keywords)
}

fn keyword_names(conn: &rusqlite::Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM keywords ORDER BY name ASC;")
        .unwrap();
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    names
}

fn expect_validation(err: ArticleServiceError, field: &str, message: &str) {
    match err {
        ArticleServiceError::Validation(errors) => {
            assert_eq!(errors.messages_for(field), vec![message], "{errors}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn ai_update_scenario_creates_keywords_and_blocks_duplicate_title() {
    let conn = open_db_in_memory().unwrap();
    let r1 = seed_redactor(&conn, "r1", "Ada", "Lovelace");
    let service = ArticleService::new(SqliteArticleRepository::try_new(&conn).unwrap());

    let article = service
        .create_article(r1.id, draft("AI Update", "ai, tech"))
        .unwrap();
    assert_eq!(article.topic.name, "Tech");
    assert_eq!(article.keyword_names(), vec!["ai", "tech"]);
    assert_eq!(article.author_ids(), vec![r1.id]);
    assert_eq!(keyword_names(&conn), vec!["ai", "tech"]);

    let err = service
        .create_article(r1.id, draft("AI Update", "other"))
        .unwrap_err();
    expect_validation(err, "title", DUPLICATE_TITLE_MESSAGE);
    assert_eq!(count_rows(&conn, "articles"), 1);
    assert_eq!(keyword_names(&conn), vec!["ai", "tech"]);
}

#[test]
fn title_uniqueness_is_case_sensitive() {
    let conn = open_db_in_memory().unwrap();
    let r1 = seed_redactor(&conn, "r1", "Ada", "Lovelace");
    let service = ArticleService::new(SqliteArticleRepository::try_new(&conn).unwrap());

    service.create_article(r1.id, draft("AI Update", "")).unwrap();
    service.create_article(r1.id, draft("ai update", "")).unwrap();
    assert_eq!(count_rows(&conn, "articles"), 2);
}

#[test]
fn saving_same_keyword_text_twice_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let r1 = seed_redactor(&conn, "r1", "Ada", "Lovelace");
    let service = ArticleService::new(SqliteArticleRepository::try_new(&conn).unwrap());

    let created = service
        .create_article(r1.id, draft("Rust", "systems, , Systems ,systems"))
        .unwrap();
    assert_eq!(created.keyword_names(), vec!["Systems", "systems"]);

    let updated = service
        .update_article(r1.id, created.id, draft("Rust", "systems, Systems"))
        .unwrap();
    assert_eq!(updated.keywords, created.keywords);
    assert_eq!(count_rows(&conn, "keywords"), 2);
    assert_eq!(count_rows(&conn, "article_keywords"), 2);
}

#[test]
fn keyword_reconciliation_replaces_links_and_keeps_store() {
    let conn = open_db_in_memory().unwrap();
    let r1 = seed_redactor(&conn, "r1", "Ada", "Lovelace");
    let service = ArticleService::new(SqliteArticleRepository::try_new(&conn).unwrap());

    let created = service.create_article(r1.id, draft("Rust", "A, B")).unwrap();
    let updated = service
        .update_article(r1.id, created.id, draft("Rust", "B, C"))
        .unwrap();

    assert_eq!(updated.keyword_names(), vec!["B", "C"]);
    assert_eq!(keyword_names(&conn), vec!["A", "B", "C"]);
    assert_eq!(service.keyword_text(created.id).unwrap(), "B, C");
}

#[test]
fn empty_keyword_text_clears_links() {
    let conn = open_db_in_memory().unwrap();
    let r1 = seed_redactor(&conn, "r1", "Ada", "Lovelace");
    let service = ArticleService::new(SqliteArticleRepository::try_new(&conn).unwrap());

    let created = service.create_article(r1.id, draft("Rust", "A")).unwrap();
    let updated = service
        .update_article(r1.id, created.id, draft("Rust", " , "))
        .unwrap();
    assert!(updated.keywords.is_empty());
    assert_eq!(count_rows(&conn, "keywords"), 1);
}

#[test]
fn empty_author_set_defaults_to_actor_and_co_authors_are_kept() {
    let conn = open_db_in_memory().unwrap();
    let r1 = seed_redactor(&conn, "r1", "Ada", "Lovelace");
    let r2 = seed_redactor(&conn, "r2", "Grace", "Hopper");
    let service = ArticleService::new(SqliteArticleRepository::try_new(&conn).unwrap());

    let solo = service.create_article(r1.id, draft("Solo", "")).unwrap();
    assert_eq!(solo.author_ids(), vec![r1.id]);

    let shared = service
        .create_article(r1.id, draft("Shared", "").with_authors(vec![r2.id, r2.id]))
        .unwrap();
    let mut authors = shared.author_ids();
    authors.sort();
    let mut expected = vec![r1.id, r2.id];
    expected.sort();
    assert_eq!(authors, expected);
    assert!(service.is_author(shared.id, r2.id).unwrap());
}

#[test]
fn non_author_cannot_update_or_delete() {
    let conn = open_db_in_memory().unwrap();
    let r1 = seed_redactor(&conn, "r1", "Ada", "Lovelace");
    let outsider = seed_redactor(&conn, "r2", "Grace", "Hopper");
    let service = ArticleService::new(SqliteArticleRepository::try_new(&conn).unwrap());
    let article = service.create_article(r1.id, draft("Mine", "")).unwrap();

    let err = service
        .update_article(outsider.id, article.id, draft("Taken over", ""))
        .unwrap_err();
    assert!(matches!(err, ArticleServiceError::ArticleNotFound(id) if id == article.id));

    let err = service.delete_article(outsider.id, article.id).unwrap_err();
    assert!(matches!(err, ArticleServiceError::ArticleNotFound(_)));

    let stored = service.get_article(article.id).unwrap().unwrap();
    assert_eq!(stored.title, "Mine");

    service.delete_article(r1.id, article.id).unwrap();
    assert!(service.get_article(article.id).unwrap().is_none());
    assert_eq!(count_rows(&conn, "article_authors"), 0);
}

#[test]
fn update_keeps_own_title_and_publish_date() {
    let conn = open_db_in_memory().unwrap();
    let r1 = seed_redactor(&conn, "r1", "Ada", "Lovelace");
    let service = ArticleService::new(SqliteArticleRepository::try_new(&conn).unwrap());
    let article = service.create_article(r1.id, draft("Stable", "")).unwrap();

    conn.execute(
        "UPDATE articles SET published_date = '2020-01-02' WHERE id = ?1;",
        params![article.id.to_string()],
    )
    .unwrap();

    let updated = service
        .update_article(
            r1.id,
            article.id,
            ArticleDraft::new("Stable", "New body", TopicRef::Named("Science".to_string())),
        )
        .unwrap();
    assert_eq!(updated.title, "Stable");
    assert_eq!(updated.content, "New body");
    assert_eq!(updated.topic.name, "Science");
    assert_eq!(updated.published_date, "2020-01-02");
}

#[test]
fn update_to_another_articles_title_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let r1 = seed_redactor(&conn, "r1", "Ada", "Lovelace");
    let service = ArticleService::new(SqliteArticleRepository::try_new(&conn).unwrap());
    service.create_article(r1.id, draft("First", "")).unwrap();
    let second = service.create_article(r1.id, draft("Second", "")).unwrap();

    let err = service
        .update_article(r1.id, second.id, draft("First", ""))
        .unwrap_err();
    expect_validation(err, "title", DUPLICATE_TITLE_MESSAGE);
}

#[test]
fn unknown_topic_and_author_become_field_errors() {
    let conn = open_db_in_memory().unwrap();
    let r1 = seed_redactor(&conn, "r1", "Ada", "Lovelace");
    let service = ArticleService::new(SqliteArticleRepository::try_new(&conn).unwrap());

    let err = service
        .create_article(
            r1.id,
            ArticleDraft::new("Orphan", "Body", TopicRef::Existing(404)),
        )
        .unwrap_err();
    expect_validation(err, "topic", INVALID_CHOICE_MESSAGE);

    let err = service
        .create_article(r1.id, draft("Ghost", "").with_authors(vec![Uuid::new_v4()]))
        .unwrap_err();
    expect_validation(err, "authors", INVALID_CHOICE_MESSAGE);
    assert_eq!(count_rows(&conn, "articles"), 0);
}

#[test]
fn structural_errors_are_reported_together() {
    let conn = open_db_in_memory().unwrap();
    let r1 = seed_redactor(&conn, "r1", "Ada", "Lovelace");
    let service = ArticleService::new(SqliteArticleRepository::try_new(&conn).unwrap());

    let err = service
        .create_article(
            r1.id,
            ArticleDraft::new("x".repeat(121), "  ", TopicRef::Named("Tech".to_string())),
        )
        .unwrap_err();
    match err {
        ArticleServiceError::Validation(errors) => {
            assert!(errors.has_field("title"));
            assert!(errors.has_field("content"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(count_rows(&conn, "topics"), 0);
}

#[test]
fn repository_rejects_taken_title_inside_its_transaction() {
    let conn = open_db_in_memory().unwrap();
    let r1 = seed_redactor(&conn, "r1", "Ada", "Lovelace");
    let service = ArticleService::new(SqliteArticleRepository::try_new(&conn).unwrap());
    service
        .create_article(r1.id, draft("AI Update", "ai"))
        .unwrap();

    let repo = SqliteArticleRepository::try_new(&conn).unwrap();
    let write = ArticleDraft::new("AI Update", "Body", TopicRef::Named("Fresh".to_string()))
        .with_keywords("k1")
        .into_write(r1.id);
    match repo.insert_article(&write) {
        Err(RepoError::DuplicateTitle(title)) => assert_eq!(title, "AI Update"),
        other => panic!("unexpected result: {other:?}"),
    }

    assert_eq!(count_rows(&conn, "articles"), 1);
    assert_eq!(count_rows(&conn, "topics"), 1);
    assert_eq!(keyword_names(&conn), vec!["ai"]);
}

#[test]
fn unknown_co_author_rolls_back_new_topic() {
    let conn = open_db_in_memory().unwrap();
    let r1 = seed_redactor(&conn, "r1", "Ada", "Lovelace");
    let service = ArticleService::new(SqliteArticleRepository::try_new(&conn).unwrap());

    let fresh = ArticleDraft::new("Fresh News", "Body", TopicRef::Named("Fresh".to_string()))
        .with_keywords("k1, k2")
        .with_authors(vec![Uuid::new_v4()]);
    let err = service.create_article(r1.id, fresh).unwrap_err();
    expect_validation(err, "authors", INVALID_CHOICE_MESSAGE);

    assert_eq!(count_rows(&conn, "topics"), 0);
    assert_eq!(count_rows(&conn, "keywords"), 0);
    assert_eq!(count_rows(&conn, "articles"), 0);
}

#[test]
fn failed_link_write_rolls_back_article_topic_and_keywords() {
    let conn = open_db_in_memory().unwrap();
    let r1 = seed_redactor(&conn, "r1", "Ada", "Lovelace");
    conn.execute_batch(
        "CREATE TRIGGER block_authors BEFORE INSERT ON article_authors
         BEGIN SELECT RAISE(ABORT, 'blocked'); END;",
    )
    .unwrap();
    let service = ArticleService::new(SqliteArticleRepository::try_new(&conn).unwrap());

    let err = service
        .create_article(r1.id, draft("Blocked", "k1, k2"))
        .unwrap_err();
    assert!(
        !matches!(err, ArticleServiceError::Validation(_)),
        "unexpected error: {err}"
    );

    assert_eq!(count_rows(&conn, "articles"), 0);
    assert_eq!(count_rows(&conn, "topics"), 0);
    assert_eq!(count_rows(&conn, "keywords"), 0);
    assert_eq!(count_rows(&conn, "article_keywords"), 0);
}

#[test]
fn keyword_lists_beyond_sqlite_variable_limit_are_saved() {
    let conn = open_db_in_memory().unwrap();
    let r1 = seed_redactor(&conn, "r1", "Ada", "Lovelace");
    let service = ArticleService::new(SqliteArticleRepository::try_new(&conn).unwrap());
    service
        .create_article(r1.id, draft("Seed", "kw00042"))
        .unwrap();

    let text = (0..33_000)
        .map(|index| format!("kw{index:05}"))
        .collect::<Vec<_>>()
        .join(", ");
    let article = service
        .create_article(r1.id, draft("Many Keywords", &text))
        .unwrap();

    assert_eq!(article.keywords.len(), 33_000);
    assert_eq!(count_rows(&conn, "keywords"), 33_000);
    assert_eq!(article.keyword_names()[0], "kw00000");
    assert_eq!(article.keyword_names()[32_999], "kw32999");
}

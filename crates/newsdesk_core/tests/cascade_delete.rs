mod common;

use common::{count_rows, seed_redactor};
use newsdesk_core::db::open_db_in_memory;
use newsdesk_core::{
    ArticleDraft, ArticleService, RedactorService, RedactorServiceError,
    SqliteArticleRepository, SqliteRedactorRepository, TopicRef,
};
use uuid::Uuid;

fn draft(title: &str) -> ArticleDraft {
    ArticleDraft::new(title, "Body", TopicRef::Named("Politics".to_string()))
        .with_keywords("vote, budget")
}

#[test]
fn deleting_redactor_removes_only_sole_authored_articles() {
    let conn = open_db_in_memory().unwrap();
    let r1 = seed_redactor(&conn, "r1", "Ada", "Lovelace");
    let r2 = seed_redactor(&conn, "r2", "Grace", "Hopper");
    let articles = ArticleService::new(SqliteArticleRepository::try_new(&conn).unwrap());
    let redactors = RedactorService::new(SqliteRedactorRepository::try_new(&conn).unwrap());

    let solo = articles.create_article(r1.id, draft("Solo piece")).unwrap();
    let shared = articles
        .create_article(r1.id, draft("Joint piece").with_authors(vec![r2.id]))
        .unwrap();
    let other = articles.create_article(r2.id, draft("Other piece")).unwrap();

    let report = redactors.delete_redactor(r1.id).unwrap();
    assert_eq!(report.redactor_id, r1.id);
    assert_eq!(report.deleted_articles, vec![solo.id]);

    assert!(articles.get_article(solo.id).unwrap().is_none());
    let kept = articles.get_article(shared.id).unwrap().unwrap();
    assert_eq!(kept.author_ids(), vec![r2.id]);
    assert!(articles.get_article(other.id).unwrap().is_some());
    assert!(redactors.get_redactor(r1.id).unwrap().is_none());

    // Keywords outlive the articles that used them.
    assert_eq!(count_rows(&conn, "keywords"), 2);
    assert_eq!(count_rows(&conn, "article_authors"), 2);
}

#[test]
fn deleting_redactor_without_articles_reports_nothing() {
    let conn = open_db_in_memory().unwrap();
    let r1 = seed_redactor(&conn, "r1", "Ada", "Lovelace");
    let redactors = RedactorService::new(SqliteRedactorRepository::try_new(&conn).unwrap());

    let report = redactors.delete_redactor(r1.id).unwrap();
    assert!(report.deleted_articles.is_empty());
    assert_eq!(count_rows(&conn, "redactors"), 0);
}

#[test]
fn deleting_unknown_redactor_fails_without_side_effects() {
    let conn = open_db_in_memory().unwrap();
    let r1 = seed_redactor(&conn, "r1", "Ada", "Lovelace");
    let articles = ArticleService::new(SqliteArticleRepository::try_new(&conn).unwrap());
    let redactors = RedactorService::new(SqliteRedactorRepository::try_new(&conn).unwrap());
    articles.create_article(r1.id, draft("Stays")).unwrap();

    let missing = Uuid::new_v4();
    let err = redactors.delete_redactor(missing).unwrap_err();
    assert!(matches!(err, RedactorServiceError::RedactorNotFound(id) if id == missing));
    assert_eq!(count_rows(&conn, "articles"), 1);
}

#[test]
fn cascade_report_serializes_ids() {
    let conn = open_db_in_memory().unwrap();
    let r1 = seed_redactor(&conn, "r1", "Ada", "Lovelace");
    let articles = ArticleService::new(SqliteArticleRepository::try_new(&conn).unwrap());
    let redactors = RedactorService::new(SqliteRedactorRepository::try_new(&conn).unwrap());
    let solo = articles.create_article(r1.id, draft("Gone")).unwrap();

    let report = redactors.delete_redactor(r1.id).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["redactor_id"], r1.id.to_string());
    assert_eq!(json["deleted_articles"][0], solo.id.to_string());
}

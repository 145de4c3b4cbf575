#![allow(dead_code)]

use chrono::DateTime;
use oxide_reconcile::prelude::*;

pub fn applied(migration: &str, secs: i64) -> HistoryEntry {
    HistoryEntry::new(migration, DateTime::from_timestamp(secs, 0).unwrap())
}

pub fn id() -> Column {
    Column::new("id", ColumnType::Integer)
        .primary_key()
        .auto_increment()
        .append("AUTO_INCREMENT PRIMARY KEY")
}

/// Records the history of a small blog schema:
///
/// - `users` and `posts` reference each other
/// - `labels` was created as `tags`, got its primary key afterwards, had a
///   column renamed and was finally renamed itself
/// - `legacy` was created and dropped again
pub fn blog_history() -> Snapshot {
    let mut snapshot = Snapshot::default();

    snapshot
        .record(
            applied("m240101_000000_create_users", 100),
            &[
                StructureChange::new(
                    "users",
                    Change::CreateTable(vec![
                        id(),
                        Column::new("email", ColumnType::String).size(255).not_null(),
                    ]),
                ),
                StructureChange::new(
                    "users",
                    Change::CreateIndex(Index::new("idx_users_email", ["email"], true)),
                ),
                StructureChange::new(
                    "legacy",
                    Change::CreateTable(vec![Column::new("id", ColumnType::PrimaryKey)]),
                ),
            ],
        )
        .unwrap();

    snapshot
        .record(
            applied("m240102_000000_create_posts", 200),
            &[
                StructureChange::new(
                    "posts",
                    Change::CreateTable(vec![
                        id(),
                        Column::new("author_id", ColumnType::Integer).not_null(),
                        Column::new("title", ColumnType::String).size(200).not_null(),
                        Column::new("body", ColumnType::Text),
                        Column::new("price", ColumnType::Decimal).precision(10, None),
                    ]),
                ),
                StructureChange::new(
                    "posts",
                    Change::AddForeignKey(
                        ForeignKey::new("fk_posts_author", ["author_id"], "users", ["id"])
                            .on_delete(ForeignKeyAction::Cascade),
                    ),
                ),
                StructureChange::new("legacy", Change::DropTable),
            ],
        )
        .unwrap();

    snapshot
        .record(
            applied("m240103_000000_add_featured_post", 300),
            &[
                StructureChange::new(
                    "users",
                    Change::AddColumn(Column::new("featured_post_id", ColumnType::Integer)),
                ),
                StructureChange::new(
                    "users",
                    Change::AddForeignKey(
                        ForeignKey::new("fk_users_featured_post", ["featured_post_id"], "posts", ["id"])
                            .on_delete(ForeignKeyAction::SetNull),
                    ),
                ),
            ],
        )
        .unwrap();

    snapshot
        .record(
            applied("m240104_000000_create_tags", 400),
            &[
                StructureChange::new(
                    "tags",
                    Change::CreateTable(vec![
                        Column::new("id", ColumnType::Integer).not_null(),
                        Column::new("name", ColumnType::String).size(64),
                    ]),
                ),
                StructureChange::new(
                    "tags",
                    Change::AddPrimaryKey(PrimaryKey::new(["id"]).named("pk_tags")),
                ),
                StructureChange::new(
                    "tags",
                    Change::RenameColumn(ColumnRename {
                        old: "name".to_string(),
                        new: "label".to_string(),
                    }),
                ),
                StructureChange::new(
                    "tags",
                    Change::AlterColumn(Column::new("label", ColumnType::String).size(128).not_null()),
                ),
            ],
        )
        .unwrap();

    snapshot
        .record(
            applied("m240105_000000_rename_tags", 500),
            &[
                StructureChange::new("labels", Change::RenameTable("tags".to_string())),
                StructureChange::new(
                    "labels",
                    Change::AddCommentOnColumn(ColumnComment {
                        column: "label".to_string(),
                        comment: "Display name".to_string(),
                    }),
                ),
            ],
        )
        .unwrap();

    snapshot
}

/// Live structures of a database created purely by [`blog_history`].
pub fn blog_live() -> Vec<Structure> {
    vec![
        Structure::new("users")
            .column(id())
            .column(Column::new("email", ColumnType::String).size(255).not_null().unique())
            .column(Column::new("featured_post_id", ColumnType::Integer))
            .foreign_key(
                ForeignKey::new("fk_users_featured_post", ["featured_post_id"], "posts", ["id"])
                    .on_delete(ForeignKeyAction::SetNull),
            )
            .index(Index::new("idx_users_email", ["email"], true)),
        Structure::new("posts")
            .column(id())
            .column(Column::new("author_id", ColumnType::Integer).not_null())
            .column(Column::new("title", ColumnType::String).size(200).not_null())
            .column(Column::new("body", ColumnType::Text))
            .column(Column::new("price", ColumnType::Decimal).precision(10, Some(0)))
            .foreign_key(
                ForeignKey::new("fk_posts_author", ["author_id"], "users", ["id"])
                    .on_delete(ForeignKeyAction::Cascade),
            ),
        Structure::new("labels")
            .column(Column::new("id", ColumnType::Integer).primary_key())
            .column(
                Column::new("label", ColumnType::String)
                    .size(128)
                    .not_null()
                    .comment("Display name"),
            ),
    ]
}

/// The recorded history plus the live structures it produced.
pub fn blog_snapshot() -> Snapshot {
    let mut snapshot = blog_history();
    snapshot.structures = blog_live();
    snapshot
}

use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Teams
    create_indexes(
        db,
        "teams",
        vec![
            index_unique(bson::doc! { "join_code": 1 }),
            index(bson::doc! { "leader_id": 1, "status": 1 }),
            index(bson::doc! { "status": 1, "is_public": 1, "is_recruiting": 1 }),
        ],
    )
    .await?;

    // Team Members
    create_indexes(
        db,
        "team_members",
        vec![
            index_unique(bson::doc! { "team_id": 1, "student_id": 1 }),
            index(bson::doc! { "student_id": 1, "status": 1 }),
        ],
    )
    .await?;

    // Invitations
    create_indexes(
        db,
        "invitations",
        vec![
            index(bson::doc! { "recipient_id": 1, "status": 1 }),
            index(bson::doc! { "team_id": 1, "status": 1 }),
        ],
    )
    .await?;

    // Join Requests
    create_indexes(
        db,
        "join_requests",
        vec![
            index(bson::doc! { "team_id": 1, "status": 1 }),
            index(bson::doc! { "student_id": 1, "status": 1 }),
        ],
    )
    .await?;

    // Mentor Applications
    create_indexes(
        db,
        "mentor_applications",
        vec![
            index(bson::doc! { "team_id": 1, "status": 1 }),
            index(bson::doc! { "mentor_id": 1, "status": 1 }),
            index(bson::doc! { "needs_reconciliation": 1 }),
        ],
    )
    .await?;

    // Activity Logs
    create_indexes(
        db,
        "activity_logs",
        vec![
            index(bson::doc! { "team_id": 1, "created_at": -1 }),
            index(bson::doc! { "team_id": 1, "action": 1, "created_at": -1 }),
        ],
    )
    .await?;

    // Projects
    create_indexes(
        db,
        "projects",
        vec![index(bson::doc! { "team_id": 1, "status": 1 })],
    )
    .await?;

    // Students
    create_indexes(db, "students", vec![index(bson::doc! { "team_id": 1 })]).await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}

use mongodb::bson::{doc, to_bson, Document};

use crate::{
    database::{parse_object_id, Database},
    models::{
        now_ts, parse_enum, ApprovalDecisionRequest, ApprovalStatus, CreateProjectRequest,
        EnumField, JoinProjectRequest, ManagerApproval, Participant, Project, ProjectQuery,
        ProjectStatus, Schema, UpdateProjectRequest, ValidationError,
    },
    utils::AppError,
};

/// Fields owned by the edit endpoint; participants change only through
/// join and approval.
const EDITABLE_FIELDS: &[&str] = &[
    "title",
    "description",
    "required_skills",
    "status",
    "start_date",
    "end_date",
];

fn list_filter(query: &ProjectQuery) -> Result<Document, AppError> {
    let mut filter = doc! {};
    if let Some(status) = &query.status {
        let status: ProjectStatus = parse_enum(Project::COLLECTION, "status", status)?;
        filter.insert("status", status.as_str());
    }
    if let Some(creator_id) = &query.creator_id {
        filter.insert("creator_id", creator_id);
    }
    Ok(filter)
}

pub async fn list_projects(db: &Database, query: &ProjectQuery) -> Result<Vec<Project>, AppError> {
    let mut projects = db.repo::<Project>().find(list_filter(query)?).await?;
    projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(projects)
}

pub async fn create_project(db: &Database, request: CreateProjectRequest) -> Result<Project, AppError> {
    let project = Project::try_from(request)?;
    let project = db.repo::<Project>().insert(project).await?;
    log::info!("🚀 Project created: {} ({})", project.title, project.status);
    Ok(project)
}

pub async fn get_project(db: &Database, id: &str) -> Result<Project, AppError> {
    db.repo::<Project>().get(parse_object_id(id)?).await
}

pub async fn update_project(
    db: &Database,
    id: &str,
    request: UpdateProjectRequest,
) -> Result<Project, AppError> {
    let repo = db.repo::<Project>();
    let mut project = repo.get(parse_object_id(id)?).await?;
    request.apply(&mut project)?;
    repo.save_fields(project, EDITABLE_FIELDS).await
}

pub async fn delete_project(db: &Database, id: &str) -> Result<(), AppError> {
    if db.repo::<Project>().delete(parse_object_id(id)?).await? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("projects {}", id)))
    }
}

/// Adiciona participante com aprovação do gestor pendente.
/// O filtro `$ne` garante no máximo uma entrada por usuário mesmo com
/// pedidos simultâneos.
pub async fn join_project(db: &Database, id: &str, request: JoinProjectRequest) -> Result<Project, AppError> {
    let repo = db.repo::<Project>();
    let oid = parse_object_id(id)?;
    let mut project = repo.get(oid).await?;

    let user_id = request.user_id.clone();
    let participant = Participant {
        user_id: request.user_id,
        role: request.role,
        joined_at: now_ts(),
        manager_approval: ManagerApproval::default(),
    };
    project.participants.push(participant.clone());
    project.validate()?;

    let filter = doc! { "_id": oid, "participants.user_id": { "$ne": user_id.as_str() } };
    let update = doc! { "$push": { "participants": to_bson(&participant)? } };
    let Some(project) = repo.update(filter, update).await? else {
        return match repo.find_by_id(oid).await? {
            Some(_) => Err(AppError::Conflict(format!(
                "user {} already joined project {}",
                user_id, id
            ))),
            None => Err(AppError::NotFound(format!("projects {}", id))),
        };
    };
    log::info!("🙋 Participant {} joined project {}", user_id, id);
    Ok(project)
}

/// Registra a decisão do gestor. Só aceita approved ou rejected.
pub async fn decide_approval(
    db: &Database,
    id: &str,
    user_id: &str,
    request: ApprovalDecisionRequest,
) -> Result<Project, AppError> {
    let status: ApprovalStatus =
        parse_enum(Project::COLLECTION, "manager_approval.status", &request.status)?;
    if status == ApprovalStatus::Pending {
        return Err(ValidationError::single(
            Project::COLLECTION,
            "manager_approval.status",
            "decision must be approved or rejected",
        )
        .into());
    }

    let repo = db.repo::<Project>();
    let oid = parse_object_id(id)?;
    let mut project = repo.get(oid).await?;

    let position = project
        .participant_index(user_id)
        .ok_or_else(|| AppError::NotFound(format!("participant {} in project {}", user_id, id)))?;
    let approval = ManagerApproval {
        status,
        manager_id: Some(request.manager_id),
        decided_at: Some(now_ts()),
        note: request.note,
    };
    project.participants[position].manager_approval = approval.clone();
    project.validate()?;

    // Participantes só são adicionados no fim, então a posição continua válida
    let mut filter = doc! { "_id": oid };
    filter.insert(format!("participants.{}.user_id", position), user_id);
    let mut set = Document::new();
    set.insert(format!("participants.{}.manager_approval", position), to_bson(&approval)?);
    let project = repo
        .update(filter, doc! { "$set": set })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("participant {} in project {}", user_id, id)))?;
    log::info!("✅ Participation of {} in project {} marked {}", user_id, id, status);
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::{database, yielding_database};

    fn request(creator: &str, status: Option<&str>) -> CreateProjectRequest {
        CreateProjectRequest {
            creator_id: creator.into(),
            title: "Mentoring platform".into(),
            description: "Match mentors and mentees".into(),
            required_skills: vec!["rust".into()],
            status: status.map(String::from),
            start_date: None,
            end_date: None,
        }
    }

    fn join(user: &str) -> JoinProjectRequest {
        JoinProjectRequest {
            user_id: user.into(),
            role: Some("developer".into()),
        }
    }

    #[tokio::test]
    async fn joined_participant_starts_pending_and_cannot_join_twice() {
        let db = database().await;
        let project = create_project(&db, request("u1", None)).await.unwrap();
        assert_eq!(project.status, ProjectStatus::Open);
        let id = project.id.unwrap().to_hex();

        let project = join_project(&db, &id, join("u2")).await.unwrap();
        assert_eq!(project.participants.len(), 1);
        assert_eq!(project.participants[0].manager_approval.status, ApprovalStatus::Pending);

        let err = join_project(&db, &id, join("u2")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn approval_records_manager_and_time() {
        let db = database().await;
        let project = create_project(&db, request("u1", None)).await.unwrap();
        let id = project.id.unwrap().to_hex();
        join_project(&db, &id, join("u2")).await.unwrap();

        let project = decide_approval(
            &db,
            &id,
            "u2",
            ApprovalDecisionRequest {
                status: "approved".into(),
                manager_id: "boss".into(),
                note: Some("go for it".into()),
            },
        )
        .await
        .unwrap();

        let approval = &project.participants[0].manager_approval;
        assert_eq!(approval.status, ApprovalStatus::Approved);
        assert_eq!(approval.manager_id.as_deref(), Some("boss"));
        assert!(approval.decided_at.is_some());
    }

    #[tokio::test]
    async fn approval_rejects_pending_and_unknown_participant() {
        let db = database().await;
        let project = create_project(&db, request("u1", None)).await.unwrap();
        let id = project.id.unwrap().to_hex();
        join_project(&db, &id, join("u2")).await.unwrap();

        let decision = |status: &str| ApprovalDecisionRequest {
            status: status.into(),
            manager_id: "boss".into(),
            note: None,
        };

        assert!(matches!(
            decide_approval(&db, &id, "u2", decision("pending")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            decide_approval(&db, &id, "u2", decision("maybe")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            decide_approval(&db, &id, "u9", decision("rejected")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn simultaneous_joins_keep_one_entry_per_user() {
        let db = yielding_database().await;
        let project = create_project(&db, request("u1", None)).await.unwrap();
        let id = project.id.unwrap().to_hex();

        let (a, b, c) = tokio::join!(
            join_project(&db, &id, join("u2")),
            join_project(&db, &id, join("u2")),
            join_project(&db, &id, join("u3"))
        );
        let results = [a, b, c];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 2);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(AppError::Conflict(_))))
                .count(),
            1
        );

        let stored = get_project(&db, &id).await.unwrap();
        assert_eq!(stored.participants.len(), 2);
        assert!(stored.has_participant("u2"));
        assert!(stored.has_participant("u3"));
    }

    #[tokio::test]
    async fn join_on_missing_project_is_not_found() {
        let db = database().await;
        assert!(matches!(
            join_project(&db, "64b7f0c2a1b2c3d4e5f60718", join("u2")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn approval_requires_manager_id() {
        let db = database().await;
        let project = create_project(&db, request("u1", None)).await.unwrap();
        let id = project.id.unwrap().to_hex();
        join_project(&db, &id, join("u2")).await.unwrap();

        let err = decide_approval(
            &db,
            &id,
            "u2",
            ApprovalDecisionRequest {
                status: "approved".into(),
                manager_id: "  ".into(),
                note: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ref e) if e.has_field("participants.0.manager_approval.manager_id")
        ));

        let stored = get_project(&db, &id).await.unwrap();
        assert_eq!(stored.participants[0].manager_approval.status, ApprovalStatus::Pending);
    }

    #[tokio::test]
    async fn edit_keeps_participants_that_joined_meanwhile() {
        let db = yielding_database().await;
        let project = create_project(&db, request("u1", None)).await.unwrap();
        let id = project.id.unwrap().to_hex();

        let edit = UpdateProjectRequest {
            title: Some("Mentoring platform v2".into()),
            ..Default::default()
        };
        let (edited, joined) = tokio::join!(update_project(&db, &id, edit), join_project(&db, &id, join("u2")));
        edited.unwrap();
        joined.unwrap();

        let stored = get_project(&db, &id).await.unwrap();
        assert_eq!(stored.title, "Mentoring platform v2");
        assert_eq!(stored.participants.len(), 1);
    }

    #[tokio::test]
    async fn listing_filters_by_status() {
        let db = database().await;
        create_project(&db, request("u1", None)).await.unwrap();
        create_project(&db, request("u1", Some("in-progress"))).await.unwrap();
        create_project(&db, request("u2", Some("in-progress"))).await.unwrap();

        let in_progress = list_projects(
            &db,
            &ProjectQuery {
                status: Some("in-progress".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(in_progress.len(), 2);

        let mine = list_projects(
            &db,
            &ProjectQuery {
                status: Some("in-progress".into()),
                creator_id: Some("u1".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(mine.len(), 1);

        let plan = db
            .repo::<Project>()
            .explain(list_filter(&ProjectQuery {
                status: Some("open".into()),
                ..Default::default()
            }).unwrap())
            .await
            .unwrap();
        assert_eq!(plan.index.as_deref(), Some("status_1"));
    }

    #[tokio::test]
    async fn status_update_must_stay_in_enum() {
        let db = database().await;
        let project = create_project(&db, request("u1", None)).await.unwrap();
        let id = project.id.unwrap().to_hex();

        let updated = update_project(
            &db,
            &id,
            UpdateProjectRequest {
                status: Some("cancelled".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.status, ProjectStatus::Cancelled);

        let err = update_project(
            &db,
            &id,
            UpdateProjectRequest {
                status: Some("on-hold".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref e) if e.has_field("status")));
    }
}

// Mentorias: sessões, progresso e feedback ficam embutidos no documento.
// Cada alteração é validada numa cópia local e gravada com um único
// update atômico ($push / $set), sem regravar o documento inteiro.

use mongodb::bson::{doc, to_bson, Document};

use crate::{
    database::{parse_object_id, Database, QueryPlan},
    models::{
        now_ts, AddProgressRequest, AddSessionRequest, EnumField, Feedback, Mentorship, MentorshipQuery,
        ProgressEntry, RequestMentorshipRequest, Schema, Session, UpdateMentorshipStatusRequest,
    },
    utils::AppError,
};

fn list_filter(query: &MentorshipQuery) -> Document {
    let mut filter = doc! {};
    if let Some(mentor_id) = &query.mentor_id {
        filter.insert("mentor_id", mentor_id);
    }
    if let Some(mentee_id) = &query.mentee_id {
        filter.insert("mentee_id", mentee_id);
    }
    filter
}

async fn load(db: &Database, id: &str) -> Result<Mentorship, AppError> {
    db.repo::<Mentorship>().get(parse_object_id(id)?).await
}

pub async fn request_mentorship(
    db: &Database,
    request: RequestMentorshipRequest,
) -> Result<Mentorship, AppError> {
    let mentorship = db.repo::<Mentorship>().insert(Mentorship::from(request)).await?;
    log::info!(
        "🤝 Mentorship requested: mentor {} / mentee {}",
        mentorship.mentor_id,
        mentorship.mentee_id
    );
    Ok(mentorship)
}

pub async fn list_mentorships(db: &Database, query: &MentorshipQuery) -> Result<Vec<Mentorship>, AppError> {
    let mut mentorships = db.repo::<Mentorship>().find(list_filter(query)).await?;
    mentorships.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(mentorships)
}

pub async fn get_mentorship(db: &Database, id: &str) -> Result<Mentorship, AppError> {
    load(db, id).await
}

/// Todas as mentorias do par, mais recente primeiro, junto com o plano de
/// consulta (deve ser o índice composto).
pub async fn find_by_pair(
    db: &Database,
    mentor_id: &str,
    mentee_id: &str,
) -> Result<(Vec<Mentorship>, QueryPlan), AppError> {
    let repo = db.repo::<Mentorship>();
    let filter = Mentorship::pair_filter(mentor_id, mentee_id);

    let plan = repo.explain(filter.clone()).await?;
    if plan.is_collection_scan() {
        log::warn!("⚠️  Mentorship pair query is not using an index");
    }

    let mut mentorships = repo.find(filter).await?;
    mentorships.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok((mentorships, plan))
}

/// Valida `change` aplicada ao documento atual e então grava `update`.
async fn apply_checked(
    db: &Database,
    id: &str,
    change: impl FnOnce(&mut Mentorship) -> Result<(), AppError>,
    update: Document,
) -> Result<Mentorship, AppError> {
    let oid = parse_object_id(id)?;
    let repo = db.repo::<Mentorship>();

    let mut mentorship = repo.get(oid).await?;
    change(&mut mentorship)?;
    mentorship.validate()?;

    repo.update(doc! { "_id": oid }, update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("mentorships {}", id)))
}

pub async fn update_status(
    db: &Database,
    id: &str,
    request: UpdateMentorshipStatusRequest,
) -> Result<Mentorship, AppError> {
    let status = request.parse()?;
    let update = doc! { "$set": { "status": status.as_str() } };
    let mentorship = apply_checked(
        db,
        id,
        |m| {
            m.status = status;
            Ok(())
        },
        update,
    )
    .await?;
    log::info!("🔄 Mentorship {} is now {}", id, status);
    Ok(mentorship)
}

pub async fn add_session(db: &Database, id: &str, request: AddSessionRequest) -> Result<Mentorship, AppError> {
    let session = Session {
        scheduled_at: request.scheduled_at,
        duration_minutes: request.duration_minutes,
        notes: request.notes,
        completed: false,
    };
    let update = doc! { "$push": { "sessions": to_bson(&session)? } };
    apply_checked(
        db,
        id,
        |m| {
            m.sessions.push(session);
            Ok(())
        },
        update,
    )
    .await
}

pub async fn complete_session(db: &Database, id: &str, index: usize) -> Result<Mentorship, AppError> {
    let mut set = Document::new();
    set.insert(format!("sessions.{}.completed", index), true);

    apply_checked(
        db,
        id,
        |m| {
            let session = m
                .sessions
                .get_mut(index)
                .ok_or_else(|| AppError::NotFound(format!("session {} of mentorship {}", index, id)))?;
            session.completed = true;
            Ok(())
        },
        doc! { "$set": set },
    )
    .await
}

pub async fn add_progress(db: &Database, id: &str, request: AddProgressRequest) -> Result<Mentorship, AppError> {
    let entry = ProgressEntry {
        milestone: request.milestone,
        note: request.note,
        recorded_at: now_ts(),
    };
    let update = doc! { "$push": { "progress": to_bson(&entry)? } };
    apply_checked(
        db,
        id,
        |m| {
            m.progress.push(entry);
            Ok(())
        },
        update,
    )
    .await
}

/// Substitui o feedback inteiro
pub async fn set_feedback(db: &Database, id: &str, feedback: Feedback) -> Result<Mentorship, AppError> {
    let update = doc! { "$set": { "feedback": to_bson(&feedback)? } };
    apply_checked(
        db,
        id,
        |m| {
            m.feedback = Some(feedback);
            Ok(())
        },
        update,
    )
    .await
}

pub async fn delete_mentorship(db: &Database, id: &str) -> Result<(), AppError> {
    if db.repo::<Mentorship>().delete(parse_object_id(id)?).await? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("mentorships {}", id)))
    }
}

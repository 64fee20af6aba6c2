use anyhow::Context;
use chrono::{Local, Utc};
use tracing::info;

use skillswap_db::models::{NewRequestRow, RequestChanges, RequestRow};
use skillswap_types::api::{NewRequest, RequestFilter, RequestUpdate};
use skillswap_types::models::{Identity, RequestDetail, ServiceRequest};
use skillswap_types::{Entity, RequestStatus, SwapError};

use crate::lifecycle::{self, Role};
use crate::{AppState, Result, reviews, users, validate};

pub(crate) fn to_request(row: RequestRow) -> Result<ServiceRequest> {
    let status: RequestStatus = row
        .status
        .parse()
        .with_context(|| format!("service request {} has a corrupt status", row.id))?;

    Ok(ServiceRequest {
        id: row.id,
        requester_id: row.requester_id,
        requester: row.requester_name,
        provider_id: row.provider_id,
        provider: row.provider_name,
        skill_id: row.skill_id,
        skill: row.skill_name,
        time: row.time,
        duration_minutes: row.duration,
        credit_cost: row.credit_cost,
        status,
        notes: row.notes.filter(|n| !n.is_empty()),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Loads a request and the caller's part in it.
pub(crate) fn load_for_party(
    state: &AppState,
    identity: &Identity,
    request_id: i64,
) -> Result<(ServiceRequest, Role)> {
    let row = state
        .db
        .get_request(request_id)?
        .ok_or_else(|| SwapError::not_found(Entity::ServiceRequest, request_id))?;
    let request = to_request(row)?;

    let role = Role::of(identity.user_id, request.requester_id, request.provider_id)
        .ok_or(SwapError::Forbidden("only the requester or provider can access this request"))?;
    Ok((request, role))
}

/// Books `provider_id` for one of their skills. New requests start out pending.
pub fn create(state: &AppState, identity: &Identity, req: NewRequest) -> Result<ServiceRequest> {
    if req.provider_id == identity.user_id {
        return Err(SwapError::SelfRequest);
    }

    match state.db.get_user_by_id(req.provider_id)? {
        Some(provider) if !provider.is_deleted() => {}
        _ => return Err(SwapError::UnknownProvider(req.provider_id)),
    }
    if state.db.get_skill_by_id(req.skill_id)?.is_none() {
        return Err(SwapError::UnknownSkill(req.skill_id));
    }
    if !state.db.user_has_skill(req.provider_id, req.skill_id)? {
        return Err(SwapError::SkillNotOffered {
            provider_id: req.provider_id,
            skill_id: req.skill_id,
        });
    }

    let time = validate::future_time(&req.time, Local::now().naive_local())?;
    validate::duration(req.duration_minutes)?;
    validate::credit(req.credit_cost)?;
    let notes = validate::optional_text(req.notes);

    let id = state.db.insert_request(&NewRequestRow {
        requester_id: identity.user_id,
        provider_id: req.provider_id,
        skill_id: req.skill_id,
        time,
        duration: req.duration_minutes,
        credit_cost: req.credit_cost,
        notes: notes.as_deref(),
        created_at: Utc::now(),
    })?;

    info!(
        request_id = id,
        requester_id = identity.user_id,
        provider_id = req.provider_id,
        skill_id = req.skill_id,
        "Service request created"
    );

    let row = state
        .db
        .get_request(id)?
        .ok_or_else(|| SwapError::not_found(Entity::ServiceRequest, id))?;
    to_request(row)
}

pub fn update(
    state: &AppState,
    identity: &Identity,
    request_id: i64,
    update: RequestUpdate,
) -> Result<ServiceRequest> {
    let (request, role) = load_for_party(state, identity, request_id)?;

    if update.is_empty() {
        return Err(SwapError::EmptyUpdate);
    }

    if let Some(to) = update.status {
        lifecycle::check(request.status, to, role)?;
    }

    let time = match update.time.as_deref() {
        Some(_) if role != Role::Requester => {
            return Err(SwapError::Forbidden("only the requester can reschedule a request"));
        }
        Some(value) => Some(validate::future_time(value, Local::now().naive_local())?),
        None => None,
    };
    let notes = update.notes.as_deref().map(str::trim);

    state.db.update_request(
        request_id,
        &RequestChanges {
            status: update.status.map(RequestStatus::as_str),
            notes,
            time,
            updated_at: Utc::now(),
        },
    )?;

    match update.status {
        Some(to) => info!(request_id, from = %request.status, to = %to, "Service request status changed"),
        None => info!(request_id, "Service request updated"),
    }

    let row = state
        .db
        .get_request(request_id)?
        .ok_or_else(|| SwapError::not_found(Entity::ServiceRequest, request_id))?;
    to_request(row)
}

/// Requests where the filtered user (the caller by default) is either party.
pub fn list(state: &AppState, identity: &Identity, filter: RequestFilter) -> Result<Vec<ServiceRequest>> {
    let user_id = match filter.user_id {
        Some(id) if id != identity.user_id => {
            users::require_active(state, id)?;
            id
        }
        _ => identity.user_id,
    };

    state
        .db
        .list_requests(user_id, filter.status.map(RequestStatus::as_str))?
        .into_iter()
        .map(to_request)
        .collect()
}

pub fn view(state: &AppState, identity: &Identity, request_id: i64) -> Result<RequestDetail> {
    let (request, role) = load_for_party(state, identity, request_id)?;
    let next_statuses = lifecycle::next_statuses_for(request.status, role);
    let reviews = reviews::of_request(state, request_id)?;
    Ok(RequestDetail {
        request,
        next_statuses,
        reviews,
    })
}

pub fn delete(state: &AppState, identity: &Identity, request_id: i64) -> Result<()> {
    load_for_party(state, identity, request_id)?;
    state.db.delete_request(request_id)?;
    info!(request_id, user_id = identity.user_id, "Service request deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{skills, testing};

    const LATER: &str = "2099-06-01T10:00";

    fn booking(provider: &Identity, skill_id: i64) -> NewRequest {
        NewRequest {
            provider_id: provider.user_id,
            skill_id,
            time: LATER.into(),
            duration_minutes: 60,
            credit_cost: 2,
            notes: Some("bring a laptop".into()),
        }
    }

    fn setup() -> (AppState, Identity, Identity, i64) {
        let state = testing::state();
        let alice = testing::register(&state, "alice");
        let bob = testing::register(&state, "bob");
        let skill = skills::add(&state, &bob, "Rust").unwrap();
        (state, alice, bob, skill.id)
    }

    fn status(value: RequestStatus) -> RequestUpdate {
        RequestUpdate {
            status: Some(value),
            ..Default::default()
        }
    }

    #[test]
    fn create_starts_pending_with_names_resolved() {
        let (state, alice, bob, skill_id) = setup();
        let req = create(&state, &alice, booking(&bob, skill_id)).unwrap();

        assert_eq!(req.status, RequestStatus::Pending);
        assert_eq!(req.requester, "alice");
        assert_eq!(req.provider, "bob");
        assert_eq!(req.skill, "Rust");
        assert_eq!(req.notes.as_deref(), Some("bring a laptop"));
    }

    #[test]
    fn create_checks_parties_and_skill() {
        let (state, alice, bob, skill_id) = setup();

        assert!(matches!(
            create(&state, &bob, booking(&bob, skill_id)),
            Err(SwapError::SelfRequest)
        ));

        let mut ghost = booking(&bob, skill_id);
        ghost.provider_id = 999;
        assert!(matches!(create(&state, &alice, ghost), Err(SwapError::UnknownProvider(999))));

        let mut unknown_skill = booking(&bob, skill_id);
        unknown_skill.skill_id = 999;
        assert!(matches!(
            create(&state, &alice, unknown_skill),
            Err(SwapError::UnknownSkill(999))
        ));

        let other = skills::add(&state, &alice, "Knitting").unwrap();
        assert!(matches!(
            create(&state, &alice, booking(&bob, other.id)),
            Err(SwapError::SkillNotOffered { .. })
        ));
    }

    #[test]
    fn create_validates_time_duration_and_credit() {
        let (state, alice, bob, skill_id) = setup();

        let mut past = booking(&bob, skill_id);
        past.time = "2001-01-01T10:00".into();
        assert!(matches!(create(&state, &alice, past), Err(SwapError::InvalidTime { .. })));

        let mut short = booking(&bob, skill_id);
        short.duration_minutes = 10;
        assert!(matches!(
            create(&state, &alice, short),
            Err(SwapError::InvalidDuration { min: 15 })
        ));

        let mut free = booking(&bob, skill_id);
        free.credit_cost = 0;
        assert!(matches!(create(&state, &alice, free), Err(SwapError::InvalidCredit { min: 1 })));
    }

    #[test]
    fn provider_drives_the_lifecycle() {
        let (state, alice, bob, skill_id) = setup();
        let req = create(&state, &alice, booking(&bob, skill_id)).unwrap();

        assert!(matches!(
            update(&state, &alice, req.id, status(RequestStatus::Accepted)),
            Err(SwapError::Forbidden(_))
        ));

        let accepted = update(&state, &bob, req.id, status(RequestStatus::Accepted)).unwrap();
        assert_eq!(accepted.status, RequestStatus::Accepted);

        assert!(matches!(
            update(&state, &bob, req.id, status(RequestStatus::Pending)),
            Err(SwapError::InvalidTransition {
                from: RequestStatus::Accepted,
                to: RequestStatus::Pending
            })
        ));

        let done = update(&state, &bob, req.id, status(RequestStatus::Completed)).unwrap();
        assert_eq!(done.status, RequestStatus::Completed);
        assert!(done.updated_at >= req.updated_at);
    }

    #[test]
    fn only_the_requester_reschedules() {
        let (state, alice, bob, skill_id) = setup();
        let req = create(&state, &alice, booking(&bob, skill_id)).unwrap();

        let reschedule = |time: &str| RequestUpdate {
            time: Some(time.into()),
            ..Default::default()
        };

        assert!(matches!(
            update(&state, &bob, req.id, reschedule("2099-07-01T10:00")),
            Err(SwapError::Forbidden(_))
        ));
        assert!(matches!(
            update(&state, &alice, req.id, reschedule("2000-07-01T10:00")),
            Err(SwapError::InvalidTime { .. })
        ));

        let moved = update(&state, &alice, req.id, reschedule("2099-07-01T10:00")).unwrap();
        assert_eq!(moved.time.format(validate::TIME_FORMAT).to_string(), "2099-07-01T10:00");
        assert_eq!(moved.status, RequestStatus::Pending);
    }

    #[test]
    fn outsiders_cannot_touch_a_request() {
        let (state, alice, bob, skill_id) = setup();
        let carol = testing::register(&state, "carol");
        let req = create(&state, &alice, booking(&bob, skill_id)).unwrap();

        assert!(matches!(
            update(&state, &carol, req.id, status(RequestStatus::Accepted)),
            Err(SwapError::Forbidden(_))
        ));
        assert!(matches!(view(&state, &carol, req.id), Err(SwapError::Forbidden(_))));
        assert!(matches!(delete(&state, &carol, req.id), Err(SwapError::Forbidden(_))));
        assert!(matches!(
            update(&state, &alice, 999, status(RequestStatus::Accepted)),
            Err(SwapError::NotFound { entity: Entity::ServiceRequest, id: 999 })
        ));
    }

    #[test]
    fn empty_update_is_rejected() {
        let (state, alice, bob, skill_id) = setup();
        let req = create(&state, &alice, booking(&bob, skill_id)).unwrap();
        assert!(matches!(
            update(&state, &alice, req.id, RequestUpdate::default()),
            Err(SwapError::EmptyUpdate)
        ));
    }

    #[test]
    fn view_offers_the_callers_next_steps() {
        let (state, alice, bob, skill_id) = setup();
        let req = create(&state, &alice, booking(&bob, skill_id)).unwrap();

        let as_provider = view(&state, &bob, req.id).unwrap();
        assert_eq!(
            as_provider.next_statuses,
            vec![RequestStatus::Accepted, RequestStatus::Rejected]
        );
        assert!(view(&state, &alice, req.id).unwrap().next_statuses.is_empty());
    }

    #[test]
    fn list_filters_by_party_and_status() {
        let (state, alice, bob, skill_id) = setup();
        let first = create(&state, &alice, booking(&bob, skill_id)).unwrap();
        let second = create(&state, &alice, booking(&bob, skill_id)).unwrap();
        update(&state, &bob, first.id, status(RequestStatus::Rejected)).unwrap();

        let ids: Vec<i64> = list(&state, &alice, RequestFilter::default())
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let rejected = list(
            &state,
            &bob,
            RequestFilter {
                status: Some(RequestStatus::Rejected),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].id, first.id);

        assert!(matches!(
            list(
                &state,
                &alice,
                RequestFilter {
                    user_id: Some(999),
                    ..Default::default()
                }
            ),
            Err(SwapError::NotFound { entity: Entity::User, .. })
        ));
    }

    #[test]
    fn either_party_may_delete() {
        let (state, alice, bob, skill_id) = setup();
        let first = create(&state, &alice, booking(&bob, skill_id)).unwrap();
        let second = create(&state, &alice, booking(&bob, skill_id)).unwrap();

        delete(&state, &alice, first.id).unwrap();
        delete(&state, &bob, second.id).unwrap();
        assert!(list(&state, &alice, RequestFilter::default()).unwrap().is_empty());
        assert!(matches!(delete(&state, &alice, first.id), Err(SwapError::NotFound { .. })));
    }
}

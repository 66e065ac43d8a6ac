//! Swimlane commands: add, remove, modify.
//!
//! Structurally parallel to the column commands, minus board positioning;
//! swimlanes are not reordered by this engine.

use crate::action::ActionError;
use crate::model::column::LaneStatus;
use crate::model::swimlane::{Swimlane, SwimlaneId};
use crate::repo::board_repo::{
    insert_swimlane, update_swimlane, BoardRepository, SqliteBoardRepository,
};
use rusqlite::Connection;
use time::format_description::well_known::Iso8601;
use time::PrimitiveDateTime;

/// Swimlane fields settable through the modify command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SwimlaneField {
    Title,
    WipLimit,
    Status,
    TargetStart,
    TargetEnd,
}

impl SwimlaneField {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "title" => Some(Self::Title),
            "wip_limit" => Some(Self::WipLimit),
            "status" => Some(Self::Status),
            "target_start" => Some(Self::TargetStart),
            "target_end" => Some(Self::TargetEnd),
            _ => None,
        }
    }
}

pub(crate) fn validate_add_swimlane(
    conn: &Connection,
    title: &str,
    wip_limit: i64,
) -> Result<(), ActionError> {
    if wip_limit < 0 {
        return Err(ActionError::InvalidWipLimit(wip_limit.to_string()));
    }
    let repo = SqliteBoardRepository::new(conn);
    if repo.active_swimlane_title_exists(title, None)? {
        return Err(ActionError::DuplicateSwimlaneTitle(title.to_string()));
    }
    Ok(())
}

pub(crate) fn apply_add_swimlane(
    conn: &Connection,
    title: &str,
    wip_limit: i64,
) -> Result<Swimlane, ActionError> {
    Ok(insert_swimlane(conn, title, wip_limit)?)
}

pub(crate) fn validate_remove_swimlane(
    conn: &Connection,
    swimlane_id: SwimlaneId,
) -> Result<(), ActionError> {
    let repo = SqliteBoardRepository::new(conn);
    repo.swimlane(swimlane_id, true)?
        .ok_or(ActionError::SwimlaneNotFound(swimlane_id))?;
    let active_cards = repo.swimlane_card_count(swimlane_id, None)?;
    if active_cards > 0 {
        return Err(ActionError::SwimlaneOccupied {
            swimlane_id,
            active_cards,
        });
    }
    Ok(())
}

pub(crate) fn apply_remove_swimlane(
    conn: &Connection,
    swimlane_id: SwimlaneId,
) -> Result<Swimlane, ActionError> {
    let repo = SqliteBoardRepository::new(conn);
    let mut swimlane = repo
        .swimlane(swimlane_id, true)?
        .ok_or(ActionError::SwimlaneNotFound(swimlane_id))?;
    swimlane.status = LaneStatus::Removed;
    update_swimlane(conn, &swimlane)?;
    Ok(swimlane)
}

pub(crate) fn validate_modify_swimlane(
    conn: &Connection,
    swimlane_id: SwimlaneId,
    field: &str,
    value: &str,
) -> Result<(Swimlane, SwimlaneField), ActionError> {
    let repo = SqliteBoardRepository::new(conn);
    let swimlane = repo
        .swimlane(swimlane_id, true)?
        .ok_or(ActionError::SwimlaneNotFound(swimlane_id))?;
    let field = SwimlaneField::parse(field)
        .ok_or_else(|| ActionError::UnrecognizedField(field.to_string()))?;

    match field {
        SwimlaneField::Title => {
            if value.trim().is_empty() {
                return Err(ActionError::BlankTitle);
            }
            if repo.active_swimlane_title_exists(value, Some(swimlane_id))? {
                return Err(ActionError::DuplicateSwimlaneTitle(value.to_string()));
            }
        }
        SwimlaneField::WipLimit => {
            parse_wip_limit(value)?;
        }
        SwimlaneField::Status => match LaneStatus::parse(value) {
            Some(LaneStatus::Removed) => {
                return Err(ActionError::RemoveViaModify {
                    use_instead: "remove_swimlane",
                });
            }
            Some(LaneStatus::Active) => {
                if repo.active_swimlane_title_exists(&swimlane.title, Some(swimlane_id))? {
                    return Err(ActionError::ReactivationTitleClash(swimlane.title.clone()));
                }
            }
            None => return Err(ActionError::InvalidStatusValue(value.to_string())),
        },
        SwimlaneField::TargetStart | SwimlaneField::TargetEnd => {
            parse_target_date(value)?;
        }
    }
    Ok((swimlane, field))
}

pub(crate) fn apply_modify_swimlane(
    conn: &Connection,
    swimlane_id: SwimlaneId,
    field: &str,
    value: &str,
) -> Result<Swimlane, ActionError> {
    let (mut swimlane, field) = validate_modify_swimlane(conn, swimlane_id, field, value)?;
    match field {
        SwimlaneField::Title => swimlane.title = value.to_string(),
        SwimlaneField::WipLimit => swimlane.wip_limit = parse_wip_limit(value)?,
        SwimlaneField::Status => swimlane.status = LaneStatus::Active,
        SwimlaneField::TargetStart => swimlane.target_start = parse_target_date(value)?,
        SwimlaneField::TargetEnd => swimlane.target_end = parse_target_date(value)?,
    }
    update_swimlane(conn, &swimlane)?;
    Ok(swimlane)
}

fn parse_wip_limit(value: &str) -> Result<i64, ActionError> {
    let parsed: i64 = value
        .trim()
        .parse()
        .map_err(|_| ActionError::InvalidWipLimit(value.to_string()))?;
    if parsed < 0 {
        return Err(ActionError::InvalidWipLimit(value.to_string()));
    }
    Ok(parsed)
}

/// Blank clears the date; anything else must be strict ISO-8601.
fn parse_target_date(value: &str) -> Result<Option<PrimitiveDateTime>, ActionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    PrimitiveDateTime::parse(trimmed, &Iso8601::DEFAULT)
        .map(Some)
        .map_err(|_| ActionError::InvalidTargetDate(value.to_string()))
}

//! Ban, tempban, unban and ban inspection

use urtadmin_macros::admin_action;

use super::store_event;
use crate::bans::BanState;
use crate::clock::format_expiry;
use crate::commands::{ActionContext, CommandInfo, CommandResult};
use crate::error::AdminError;
use crate::store::RecordEvent;

/// Seconds and display unit for a tempban duration (`m`, `h`, `d`, `w`)
pub(crate) fn parse_duration(amount: &str, unit: &str) -> Option<(i64, &'static str)> {
    let amount: i64 = amount.parse().ok().filter(|n| *n > 0)?;
    let (seconds, label) = match unit {
        "m" => (60, "minute(s)"),
        "h" => (3_600, "hour(s)"),
        "d" => (86_400, "day(s)"),
        "w" => (604_800, "week(s)"),
        _ => return None,
    };
    Some((amount.checked_mul(seconds)?, label))
}

fn require_guid(guid: &str, name: &str) -> Result<(), AdminError> {
    if guid.is_empty() {
        return Err(AdminError::InvalidArgument(format!("{} ^7has no GUID", name)));
    }
    Ok(())
}

#[admin_action("ban", "Ban a player permanently")]
pub(super) fn ban(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    if info.arg_count() != 2 {
        return ctx.usage("!ban <client or @id>");
    }

    let target = attempt!(ctx, ctx.find_target(info.arg(1)));
    attempt!(ctx, require_guid(&target.guid, &target.name));
    attempt!(
        ctx,
        store_event(
            ctx.store,
            &target.guid,
            RecordEvent::Ban {
                ip: target.ip.clone(),
                expires_at: 0,
            },
            ctx.now(),
        )
    );
    tracing::info!(guid = %target.guid, by = %ctx.issuer.guid, "Player banned");

    ctx.broadcast(&format!(
        "^1Warning: ^7{} ^7was banned by {}^7",
        target.name, ctx.issuer.name
    ));
    ctx.execute(&format!("addip {}", target.ip));
    if let Some(slot) = target.slot {
        ctx.execute(&format!(
            "kick {} \"You have been banned by {}\"",
            slot, ctx.issuer.name
        ));
    }
    CommandResult::Handled
}

#[admin_action("tempban", "Ban a player for a while")]
pub(super) fn tempban(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    if info.arg_count() != 4 {
        return ctx.usage("!tempban <client or @id> <duration> <m or h or d or w>");
    }

    let target = attempt!(ctx, ctx.find_target(info.arg(1)));
    attempt!(ctx, require_guid(&target.guid, &target.name));
    let now = ctx.now();
    let Some((expires_at, unit)) = parse_duration(info.arg(2), info.arg(3))
        .and_then(|(seconds, unit)| Some((now.checked_add(seconds)?, unit)))
    else {
        return ctx.usage("!tempban <client> <duration> <m or h or d or w>");
    };

    attempt!(
        ctx,
        store_event(
            ctx.store,
            &target.guid,
            RecordEvent::Ban {
                ip: target.ip.clone(),
                expires_at,
            },
            now,
        )
    );
    tracing::info!(guid = %target.guid, expires_at, by = %ctx.issuer.guid, "Player temp banned");

    ctx.broadcast(&format!(
        "^1Warning: ^7{} ^7banned for {} {} by {}^7",
        target.name,
        info.arg(2),
        unit,
        ctx.issuer.name
    ));
    if let Some(slot) = target.slot {
        ctx.execute(&format!(
            "kick {} \"You have been banned for {} {}\"",
            slot,
            info.arg(2),
            unit
        ));
    }
    CommandResult::Handled
}

#[admin_action("unban", "Lift a ban by record id")]
pub(super) fn unban(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    if info.arg_count() != 2 || !info.arg(1).starts_with('@') {
        return ctx.usage("!unban <@id>");
    }

    let target = attempt!(ctx, ctx.find_target(info.arg(1)));
    let id = target.id.unwrap_or_default();
    attempt!(
        ctx,
        store_event(ctx.store, &target.guid, RecordEvent::Unban, ctx.now())
    );
    tracing::info!(guid = %target.guid, by = %ctx.issuer.guid, "Player unbanned");

    ctx.reply(&format!(
        "^2Info^3[PM]^2: ^3Unbanned: ^5@{} ^7{} ^7his IP(^1{}^7) has been removed",
        id, target.name, target.ip
    ));
    ctx.execute(&format!("removeip {}", target.ip));
    CommandResult::Handled
}

#[admin_action("infoban", "Show the ban on a record")]
pub(super) fn infoban(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    if info.arg_count() != 2 || !info.arg(1).starts_with('@') {
        return ctx.usage("!infoban <@id>");
    }

    let target = attempt!(ctx, ctx.find_target(info.arg(1)));
    let Some(record) = attempt!(ctx, ctx.store.record(&target.guid)) else {
        return ctx.report(&AdminError::NotFound(info.arg(1).to_string()));
    };

    let mut head = format!("^2Info^3[PM]^2: ^1@{}^7 {}", record.id, record.name);
    if let Some(aka) = &record.aka {
        head.push_str(&format!(" ^3Aka:^7 {}", aka));
    }
    let line = match record.ban_state(ctx.now()) {
        BanState::Permanent => format!("{} ^3Ban: ^1Permament^7", head),
        BanState::TemporaryActive { expires_at } => {
            format!("{} ^3TempBan expire: ^7{}", head, format_expiry(expires_at))
        }
        BanState::None | BanState::Inactive { .. } => {
            format!("{} ^3Ban: ^2No Ban Active^7", head)
        }
    };
    ctx.reply(&line);
    CommandResult::Handled
}

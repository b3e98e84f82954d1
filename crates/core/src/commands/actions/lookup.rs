//! Store searches by name, address and ban

use urtadmin_macros::admin_action;

use crate::bans::BanState;
use crate::clock::format_expiry;
use crate::commands::{ActionContext, CommandInfo, CommandResult};
use crate::store::ReputationRecord;

fn record_head(record: &ReputationRecord) -> String {
    format!("^2Info^3[PM]^2: ^1@{}^7 {}", record.id, record.name)
}

fn aka_suffix(record: &ReputationRecord) -> String {
    record
        .aka
        .as_ref()
        .map(|aka| format!(" ^3Aka:^7 {}", aka))
        .unwrap_or_default()
}

fn level_line(record: &ReputationRecord) -> String {
    let mut line = format!("{} ^3Level ^7(^5{}^7)", record_head(record), record.level);
    if let Some(aka) = &record.aka {
        line.push_str(&format!(" ^3Aka:^7 {}^7", aka));
    }
    line
}

#[admin_action("lookup", "Search the database by name")]
pub(super) fn lookup(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    if info.arg_count() != 2 {
        return ctx.usage("!lookup <name>");
    }

    let records = attempt!(ctx, ctx.store.find_by_name(info.arg(1)));
    if records.is_empty() {
        ctx.reply("^1Warning^3[PM]^1: ^7No player found");
    }
    for record in &records {
        ctx.reply(&level_line(record));
    }
    CommandResult::Handled
}

#[admin_action("lookupip", "Search the database by address")]
pub(super) fn lookupip(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    if info.arg_count() != 2 {
        return ctx.usage("!lookupip <ip>");
    }

    let records = attempt!(ctx, ctx.store.find_by_ip(info.arg(1)));
    if records.is_empty() {
        ctx.reply(&format!(
            "^1Warning^3[PM]^1: ^7No player with IP (^1{}^7) found",
            info.arg(1)
        ));
    }
    for record in &records {
        ctx.reply(&level_line(record));
    }
    CommandResult::Handled
}

#[admin_action("lookupban", "Search active bans by name")]
pub(super) fn lookupban(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    if info.arg_count() != 2 {
        return ctx.usage("!lookupban <name>");
    }

    let now = ctx.now();
    let records = attempt!(ctx, ctx.store.find_bans_by_name(info.arg(1), now));
    if records.is_empty() {
        ctx.reply("^1Warning^3[PM]^1: ^7No Ban found");
    }
    for record in &records {
        let head = format!("{}{}", record_head(record), aka_suffix(record));
        match record.ban_state(now) {
            BanState::Permanent => ctx.reply(&format!("{} ^3Ban: ^1Permanent^7", head)),
            BanState::TemporaryActive { expires_at } => {
                ctx.reply(&format!("{} ^3Ban: ^1TempBan^7", head));
                ctx.reply(&format!("^3TempBan expire: ^7{}", format_expiry(expires_at)));
            }
            BanState::None | BanState::Inactive { .. } => {}
        }
    }
    CommandResult::Handled
}

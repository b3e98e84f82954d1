//! Who-is-who actions: registration, levels and player listings

use urtadmin_macros::admin_action;

use super::store_event;
use crate::clock::{format_date, format_time_of_day};
use crate::commands::context::Target;
use crate::commands::{ActionContext, CommandInfo, CommandResult};
use crate::config::CoreConfig;
use crate::error::{AdminError, AdminResult};
use crate::store::{RecordEvent, Registration, ReputationRecord, StoreClient};
use crate::text::{clean_name, eq_ignore_case};

/// Names nobody may register as or be levelled under
fn is_protected_name(config: &CoreConfig, name: &str) -> bool {
    let cleaned = clean_name(name);
    eq_ignore_case(&cleaned, &config.placeholder_name) || config.is_reserved_name(&cleaned)
}

/// Put `target` at `level`.
///
/// The alias follows the name the target is known under; level 0 drops it.
pub(crate) fn apply_level(
    store: &StoreClient,
    config: &CoreConfig,
    target: &Target,
    level: i32,
    now: i64,
) -> AdminResult<()> {
    if !(0..=config.max_level).contains(&level) {
        return Err(AdminError::InvalidArgument(format!(
            "Level must be between 0 and {}",
            config.max_level
        )));
    }
    if is_protected_name(config, &target.name) {
        return Err(AdminError::InvalidArgument(format!(
            "You can not change the level of {}^7",
            target.name
        )));
    }

    let aka = (level > 0).then(|| clean_name(&target.name));
    store_event(
        store,
        &target.guid,
        RecordEvent::SetLevel(Registration {
            name: target.name.clone(),
            aka,
            ip: target.ip.clone(),
            level,
        }),
        now,
    )?;
    tracing::info!(guid = %target.guid, level, "Level changed");
    Ok(())
}

fn first_visit_line(record: &ReputationRecord) -> String {
    format!(
        "^3First Visit: ^7{} ^3Connection ^7{} ^3times",
        format_date(record.registered_at),
        record.connections
    )
}

#[admin_action("help", "List the actions you can use")]
pub(super) fn help(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    let level = attempt!(ctx, ctx.issuer_level());

    let allowed: Vec<String> = ctx
        .levels
        .entries()
        .iter()
        .filter(|entry| entry.level <= level)
        .map(|entry| format!("^7!{} ", entry.action))
        .collect();

    ctx.reply("^3Commands List[PM]: ");
    for line in allowed.chunks(8) {
        ctx.reply(&line.concat());
    }
    CommandResult::Handled
}

#[admin_action("time", "Show the server time")]
pub(super) fn time(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    ctx.reply(&format!("^3Time[PM]:^7 {}", format_time_of_day(ctx.now())));
    CommandResult::Handled
}

#[admin_action("register", "Register your current name")]
pub(super) fn register(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    let name = ctx.issuer.name.clone();
    if is_protected_name(ctx.config, &name) {
        ctx.reply(&format!(
            "^1Warning^3[PM]^2: ^7You can not get registered with nickname '{}^7'",
            name
        ));
        return CommandResult::Handled;
    }

    let guid = ctx.issuer.guid.clone();
    let existing = attempt!(ctx, ctx.store.record(&guid));
    // Re-registering keeps the level an admin gave
    let level = match existing {
        Some(record) if record.aka.is_some() => record.level,
        _ => 1,
    };

    attempt!(
        ctx,
        store_event(
            ctx.store,
            &guid,
            RecordEvent::Register(Registration {
                name: name.clone(),
                aka: Some(clean_name(&name)),
                ip: ctx.issuer.ip.clone(),
                level,
            }),
            ctx.now(),
        )
    );

    ctx.reply(&format!(
        "^2Server^3[PM]^2: ^7You are registered with the nickname {} ^7at level (^1{}^7)",
        name, level
    ));
    CommandResult::Handled
}

#[admin_action("me", "Show your own record")]
pub(super) fn me(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    let Some(record) = attempt!(ctx, ctx.store.record(&ctx.issuer.guid)) else {
        ctx.reply(&format!(
            "^1Warning^3[PM]^2: {} is not in the database^7",
            ctx.issuer.name
        ));
        return CommandResult::Handled;
    };

    let mut line = format!(
        "^2Info^3[PM]^2: ^3ID: ^1@{} ^3Level ^7(^5{}^7)",
        record.id, record.level
    );
    if let Some(aka) = &record.aka {
        line.push_str(&format!(" ^3AKA:^7 {}^7", aka));
    }
    ctx.reply(&line);
    ctx.reply(&format!("^3IP: ^7{} ^3Guid: ^7{}", record.ip, record.guid));
    ctx.reply(&first_visit_line(&record));
    CommandResult::Handled
}

#[admin_action("admins", "List admins currently online")]
pub(super) fn admins(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    let online: Vec<(usize, String, String)> = ctx
        .sessions
        .iter()
        .filter(|s| s.has_guid())
        .map(|s| (s.slot, s.name.clone(), s.guid.clone()))
        .collect();

    ctx.reply("^2Admins online^3[PM]:");
    for (slot, name, guid) in online {
        let Some(record) = attempt!(ctx, ctx.store.record(&guid)) else {
            continue;
        };
        if record.level >= ctx.config.admin_list_min_level {
            ctx.reply(&format!(
                "^7[^1{}^7]{} Level(^5{}^7) aka {}^7",
                slot,
                name,
                record.level,
                record.aka_or_none()
            ));
        }
    }
    CommandResult::Handled
}

#[admin_action("list", "List connected players")]
pub(super) fn list(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    let online: Vec<_> = ctx.sessions.iter().cloned().collect();

    for session in online {
        let level = if session.has_guid() {
            attempt!(ctx, ctx.store.level(&session.guid)).unwrap_or(0)
        } else {
            0
        };
        ctx.reply(&format!(
            "^1PLAYER^3[PM]^1: ^7[^1{}^7]{}^3 Level^7(^2{}^7) ^3Team: {}^7",
            session.slot,
            session.name,
            level,
            session.team.label()
        ));
    }
    CommandResult::Handled
}

#[admin_action("playerinfo", "Show a player's record")]
pub(super) fn playerinfo(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    if info.arg_count() != 2 {
        return ctx.usage("!playerinfo <client or @id>");
    }

    let target = attempt!(ctx, ctx.find_target(info.arg(1)));
    let Some(record) = attempt!(ctx, ctx.store.record(&target.guid)) else {
        ctx.reply(&format!(
            "^1Warning^3[PM]^2: {} is not in the database^7",
            target.name
        ));
        return CommandResult::Handled;
    };

    let mut line = format!(
        "^2INFO^3[PM]^2: ^3ID: ^5@{} ^7{} ^3Level^7(^1{}^7)",
        record.id, record.name, record.level
    );
    if let Some(aka) = &record.aka {
        line.push_str(&format!(" ^3aka^7 {}", aka));
    }
    ctx.reply(&line);
    ctx.reply(&format!("^3IP: ^7{} ^3Guid: ^7{}", record.ip, record.guid));
    ctx.reply(&first_visit_line(&record));
    CommandResult::Handled
}

#[admin_action("setlevel", "Set a player's admin level")]
pub(super) fn setlevel(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
    if info.arg_count() != 3 {
        return ctx.usage("!setlevel <client or @id> <level>");
    }

    let Ok(level) = info.arg(2).parse::<i32>() else {
        return ctx.report(&AdminError::InvalidArgument(format!(
            "Level must be between 0 and {}",
            ctx.config.max_level
        )));
    };
    let target = attempt!(ctx, ctx.find_target(info.arg(1)));

    if is_protected_name(ctx.config, &target.name) {
        ctx.reply(&format!(
            "^1Warning^3[PM]^2: ^7You can not change the level of {}^7",
            target.name
        ));
        return CommandResult::Handled;
    }
    attempt!(
        ctx,
        apply_level(ctx.store, ctx.config, &target, level, ctx.now())
    );

    ctx.reply(&format!(
        "^2Server^3[PM]^2: ^7You have put {} ^7at level (^1{}^7)",
        target.name, level
    ));
    if let Some(slot) = target.slot {
        ctx.host.send_to(
            slot,
            &format!(
                "^2Server^3[PM]^2: ^7{} ^7just put you at level (^1{}^7)",
                ctx.issuer.name, level
            ),
        );
    }
    CommandResult::Handled
}

#[cfg(test)]
mod tests {
    use super::super::testing::{Harness, NOW};
    use crate::clock::format_date;
    use crate::commands::CommandResult;

    #[test]
    fn test_register_sets_level_one_and_alias() {
        let mut h = Harness::new();
        h.player(1, "^2Dragon", "G1", 0);

        assert_eq!(h.run(1, "!register"), CommandResult::Handled);

        let record = h.store.record("G1").unwrap().unwrap();
        assert_eq!(record.level, 1);
        assert_eq!(record.aka.as_deref(), Some("Dragon"));
        assert_eq!(
            h.host.messages_to(1),
            vec!["^2Server^3[PM]^2: ^7You are registered with the nickname ^2Dragon ^7at level (^11^7)"]
        );
    }

    #[test]
    fn test_register_keeps_given_level() {
        let mut h = Harness::new();
        h.player(1, "Dragon", "G1", 4);

        h.run(1, "!register");
        assert_eq!(h.store.level("G1").unwrap(), Some(4));
    }

    #[test]
    fn test_register_rejects_placeholder() {
        let mut h = Harness::new();
        h.player(1, "Newbie", "G1", 0);

        h.run(1, "!register");
        assert_eq!(h.store.level("G1").unwrap(), Some(0));
        assert_eq!(
            h.host.messages_to(1),
            vec!["^1Warning^3[PM]^2: ^7You can not get registered with nickname 'Newbie^7'"]
        );
    }

    #[test]
    fn test_me_shows_record() {
        let mut h = Harness::new();
        h.player(2, "Dragon", "G1", 1);

        h.run(2, "!me");
        let replies = h.host.messages_to(2);
        assert_eq!(
            replies[0],
            "^2Info^3[PM]^2: ^3ID: ^1@1 ^3Level ^7(^51^7) ^3AKA:^7 Dragon^7"
        );
        assert_eq!(replies[1], "^3IP: ^710.0.0.2 ^3Guid: ^7G1");
        assert_eq!(
            replies[2],
            format!("^3First Visit: ^7{} ^3Connection ^71 ^3times", format_date(NOW))
        );
    }

    #[test]
    fn test_help_lists_only_allowed_actions() {
        let mut h = Harness::new();
        h.player(0, "Guest", "G0", 0);

        h.run(0, "!help");
        let text = h.host.messages_to(0).concat();
        assert!(text.contains("!help "));
        assert!(text.contains("!register "));
        assert!(!text.contains("!me "));
        assert!(!text.contains("!kick "));
    }

    #[test]
    fn test_setlevel_updates_target_and_notifies() {
        let mut h = Harness::new();
        h.player(0, "Boss", "ADMIN", 5);
        h.player(4, "Helper", "G4", 0);

        h.run(0, "!setlevel help 3");

        let record = h.store.record("G4").unwrap().unwrap();
        assert_eq!(record.level, 3);
        assert_eq!(record.aka.as_deref(), Some("Helper"));
        assert_eq!(
            h.host.messages_to(0),
            vec!["^2Server^3[PM]^2: ^7You have put Helper ^7at level (^13^7)"]
        );
        assert_eq!(
            h.host.messages_to(4),
            vec!["^2Server^3[PM]^2: ^7Boss ^7just put you at level (^13^7)"]
        );

        h.run(0, "!setlevel @2 0");
        let record = h.store.record("G4").unwrap().unwrap();
        assert_eq!(record.level, 0);
        assert_eq!(record.aka, None);
    }

    #[test]
    fn test_setlevel_range_and_reserved_names() {
        let mut h = Harness::new();
        h.player(0, "Boss", "ADMIN", 5);
        h.player(5, "Newbie", "G5", 0);
        h.player(6, "Other", "G6", 0);

        h.run(0, "!setlevel Other 6");
        h.run(0, "!setlevel Other x");
        h.run(0, "!setlevel Newbie 2");
        h.run(0, "!setlevel Other");

        assert_eq!(
            h.host.messages_to(0),
            vec![
                "^1ERROR^3[PM]^1:^7 Level must be between 0 and 5",
                "^1ERROR^3[PM]^1:^7 Level must be between 0 and 5",
                "^1Warning^3[PM]^2: ^7You can not change the level of Newbie^7",
                "^3Usage[PM]:^7 !setlevel <client or @id> <level>",
            ]
        );
        assert_eq!(h.store.level("G6").unwrap(), Some(0));
        assert_eq!(h.store.level("G5").unwrap(), Some(0));
    }

    #[test]
    fn test_admins_and_list() {
        let mut h = Harness::new();
        h.player(0, "Boss", "ADMIN", 5);
        h.player(1, "Mod", "G1", 3);
        h.player(2, "Pleb", "G2", 1);

        h.run(0, "!admins");
        assert_eq!(
            h.host.messages_to(0),
            vec![
                "^2Admins online^3[PM]:",
                "^7[^10^7]Boss Level(^55^7) aka Boss^7",
                "^7[^11^7]Mod Level(^53^7) aka Mod^7",
            ]
        );

        h.host.clear();
        h.run(0, "!list");
        let lines = h.host.messages_to(0);
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[2],
            "^1PLAYER^3[PM]^1: ^7[^12^7]Pleb^3 Level^7(^21^7) ^3Team: ^3Free^7"
        );
    }

    #[test]
    fn test_playerinfo_by_id() {
        let mut h = Harness::new();
        h.player(0, "Boss", "ADMIN", 5);
        h.player(3, "Dragon", "G3", 0);

        h.run(0, "!playerinfo @2");
        let lines = h.host.messages_to(0);
        assert_eq!(lines[0], "^2INFO^3[PM]^2: ^3ID: ^5@2 ^7Dragon ^3Level^7(^10^7)");
        assert_eq!(lines[1], "^3IP: ^710.0.0.3 ^3Guid: ^7G3");

        h.host.clear();
        h.run(0, "!playerinfo @99");
        assert_eq!(
            h.host.messages_to(0),
            vec!["^1Warning^3[PM]^1: ^7Player with id ^5@99 ^7does not exist"]
        );
    }
}

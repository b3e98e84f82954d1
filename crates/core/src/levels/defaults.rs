/// Levels written to a fresh level table, in file order
pub const DEFAULT_LEVELS: &[(&str, i32)] = &[
    ("help", 0),
    ("time", 0),
    ("register", 0),
    ("me", 1),
    ("admins", 1),
    ("warn", 3),
    ("restart", 3),
    ("reload", 3),
    ("cyclemap", 3),
    ("map", 3),
    ("setnextmap", 3),
    ("pause", 3),
    ("swapteams", 3),
    ("shuffleteams", 3),
    ("slap", 3),
    ("nuke", 3),
    ("mute", 3),
    ("kill", 3),
    ("kick", 3),
    ("list", 3),
    ("playerinfo", 3),
    ("force", 3),
    ("veto", 3),
    ("rename", 3),
    ("bigtext", 3),
    ("privatebigtext", 3),
    ("lookup", 3),
    ("lookupip", 3),
    ("ban", 4),
    ("tempban", 4),
    ("lookupban", 4),
    ("infoban", 4),
    ("gametype", 4),
    ("exec", 4),
    ("superslap", 4),
    ("unban", 5),
    ("moon", 5),
    ("gravity", 5),
    ("respawndelay", 5),
    ("respawngod", 5),
    ("timelimit", 5),
    ("fraglimit", 5),
    ("caplimit", 5),
    ("matchmode", 5),
    ("swaproles", 5),
    ("friendlyfire", 5),
    ("setlevel", 5),
];

/// Built-in level for `action`, used when the table has no entry for it
pub fn builtin_level(action: &str) -> Option<i32> {
    DEFAULT_LEVELS
        .iter()
        .find(|(name, _)| *name == action)
        .map(|(_, level)| *level)
}

use thiserror::Error;

pub const NONE_CREATURE: &str = "NONE";
pub const LINEAGE_KEYWORD: &str = "LINEAGE";

pub const DEFAULT_SLUGCATS: [&str; 9] = [
    "White",
    "Yellow",
    "Red",
    "Gourmand",
    "Artificer",
    "Rivulet",
    "Spear",
    "Saint",
    "Inv",
];

/// Canonical creature names, in the order the den editor cycles them.
pub const CREATURE_TYPES: &[&str] = &[
    NONE_CREATURE,
    "PinkLizard",
    "GreenLizard",
    "BlueLizard",
    "YellowLizard",
    "WhiteLizard",
    "BlackLizard",
    "CyanLizard",
    "RedLizard",
    "Salamander",
    "SpitLizard",
    "EelLizard",
    "ZoopLizard",
    "TrainLizard",
    "BlizzardLizard",
    "IndigoLizard",
    "Spider",
    "BigSpider",
    "SpitterSpider",
    "MotherSpider",
    "SmallCentipede",
    "Centipede",
    "RedCentipede",
    "AquaCenti",
    "Centiwing",
    "DropBug",
    "EggBug",
    "FireBug",
    "Leech",
    "SeaLeech",
    "JungleLeech",
    "JetFish",
    "Snail",
    "BigEel",
    "CicadaA",
    "CicadaB",
    "Cicada",
    "Vulture",
    "KingVulture",
    "MirosVulture",
    "MirosBird",
    "BigNeedleWorm",
    "SmallNeedleWorm",
    "PoleMimic",
    "TentaclePlant",
    "Scavenger",
    "ScavengerElite",
    "ScavengerTemplar",
    "ScavengerDisciple",
    "LanternMouse",
    "GarbageWorm",
    "TubeWorm",
    "BrotherLongLegs",
    "DaddyLongLegs",
    "TerrorLongLegs",
    "HunterDaddy",
    "Inspector",
    "Deer",
    "Yeek",
    "BigMoth",
    "SmallMoth",
    "Frog",
    "Barnacle",
    "Tardigrade",
    "SkyWhale",
    "FireSprite",
    "DrillCrab",
    "SandGrub",
    "BigSandGrub",
    "BoxWorm",
    "Rattler",
    "Loach",
    "RotLoach",
    "Rat",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnParseError {
    #[error("spawn line has no `room :` prefix: `{line}`")]
    MissingRoom { line: String },
    #[error("slugcat clause is not closed: `{line}`")]
    UnclosedSlugcatClause { line: String },
    #[error("invalid pipe number `{text}`")]
    BadPipe { text: String },
    #[error("invalid lineage chance `{text}`")]
    BadChance { text: String },
    #[error("invalid creature count `{text}`")]
    BadCount { text: String },
    #[error("malformed creature entry `{text}`")]
    MalformedCreature { text: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpawnId(pub u64);

#[derive(Debug, Default)]
pub struct SpawnIdAllocator {
    next: u64,
}

impl SpawnIdAllocator {
    pub fn allocate(&mut self) -> SpawnId {
        let id = SpawnId(self.next);
        self.next += 1;
        id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatureSpawn {
    pub creature_type: String,
    pub tags: String,
    pub count: u32,
}

impl CreatureSpawn {
    pub fn placeholder() -> Self {
        Self {
            creature_type: NONE_CREATURE.to_string(),
            tags: String::new(),
            count: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineageStep {
    pub creature_type: String,
    pub tags: String,
    pub chance: f32,
}

impl LineageStep {
    pub fn placeholder() -> Self {
        Self {
            creature_type: NONE_CREATURE.to_string(),
            tags: String::new(),
            chance: 0.0,
        }
    }
}

/// A slugcat clause as written in the world file, with the set it resolved
/// to. Saving reuses `text` while the entry's set still equals `resolved`,
/// so `X-` clauses keep their short form.
#[derive(Debug, Clone, PartialEq)]
pub struct SlugcatClause {
    pub text: String,
    pub resolved: Vec<String>,
}

/// One spawn rule for one den. Both payloads always exist; `is_lineage`
/// picks the live one.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnData {
    pub id: SpawnId,
    pub pipe_number: i32,
    pub slugcats: Option<Vec<String>>,
    pub exclusive: bool,
    pub is_lineage: bool,
    pub creature: CreatureSpawn,
    pub lineage: Vec<LineageStep>,
    pub written_clause: Option<SlugcatClause>,
}

impl SpawnData {
    pub fn placeholder(id: SpawnId, pipe_number: i32) -> Self {
        Self {
            id,
            pipe_number,
            slugcats: None,
            exclusive: false,
            is_lineage: false,
            creature: CreatureSpawn::placeholder(),
            lineage: vec![LineageStep::placeholder()],
            written_clause: None,
        }
    }

    /// Equality of what would be written: the id, the clause spelling and
    /// the inactive payload are ignored.
    pub fn content_eq(&self, other: &SpawnData) -> bool {
        self.pipe_number == other.pipe_number
            && self.slugcats == other.slugcats
            && self.exclusive == other.exclusive
            && self.is_lineage == other.is_lineage
            && if self.is_lineage {
                self.lineage == other.lineage
            } else {
                self.creature == other.creature
            }
    }

    pub fn applies_to(&self, slugcat: &str) -> bool {
        match &self.slugcats {
            None => true,
            Some(names) => {
                let listed = names.iter().any(|name| name.eq_ignore_ascii_case(slugcat));
                listed != self.exclusive
            }
        }
    }

    /// Switches between single and lineage form. The side being switched
    /// to takes the other side's creature when it still holds `NONE`, so a
    /// real spawn never turns into a placeholder.
    pub fn toggle_lineage(&mut self) {
        self.is_lineage = !self.is_lineage;
        if self.is_lineage {
            if self.lineage.is_empty() {
                self.lineage.push(LineageStep::placeholder());
            }
            let first = &mut self.lineage[0];
            if first.creature_type == NONE_CREATURE {
                first.creature_type = self.creature.creature_type.clone();
                first.tags = self.creature.tags.clone();
            }
        } else if self.creature.creature_type == NONE_CREATURE {
            if let Some(first) = self.lineage.first() {
                self.creature.creature_type = first.creature_type.clone();
                self.creature.tags = first.tags.clone();
                self.creature.count = 1;
            }
        }
    }

    pub fn is_placeholder(&self) -> bool {
        if self.is_lineage {
            self.lineage
                .iter()
                .all(|step| step.creature_type == NONE_CREATURE)
        } else {
            self.creature.creature_type == NONE_CREATURE
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnLine {
    pub room: String,
    pub entries: Vec<SpawnData>,
}

/// Parses one line of the CREATURES section. Exclusive slugcat clauses are
/// resolved against `roster` and stored as the complement.
pub fn parse_spawn_line(
    line: &str,
    roster: &[String],
    ids: &mut SpawnIdAllocator,
) -> Result<SpawnLine, SpawnParseError> {
    let trimmed = line.trim();
    let (clause, body) = split_slugcat_clause(trimmed, roster)?;
    let slugcats = clause.as_ref().map(|clause| clause.resolved.clone());
    let body = body.trim();

    let is_lineage = body
        .split(':')
        .next()
        .is_some_and(|head| head.trim().eq_ignore_ascii_case(LINEAGE_KEYWORD));
    if is_lineage {
        let mut parts = body.splitn(4, ':').skip(1);
        let (Some(room), Some(pipe), Some(creatures)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(SpawnParseError::MissingRoom {
                line: trimmed.to_string(),
            });
        };
        let pipe_number = parse_pipe(pipe)?;
        let lineage = split_top_level(creatures, ',')
            .into_iter()
            .filter(|creature| !creature.trim().is_empty())
            .map(parse_lineage_step)
            .collect::<Result<Vec<_>, _>>()?;
        if lineage.is_empty() {
            return Err(SpawnParseError::MalformedCreature {
                text: creatures.trim().to_string(),
            });
        }
        return Ok(SpawnLine {
            room: room.trim().to_ascii_uppercase(),
            entries: vec![SpawnData {
                id: ids.allocate(),
                pipe_number,
                slugcats,
                exclusive: false,
                is_lineage: true,
                creature: CreatureSpawn::placeholder(),
                lineage,
                written_clause: clause,
            }],
        });
    }

    let Some((room, spawns)) = body.split_once(':') else {
        return Err(SpawnParseError::MissingRoom {
            line: trimmed.to_string(),
        });
    };
    let mut entries = Vec::new();
    for spawn in split_top_level(spawns, ',') {
        if spawn.trim().is_empty() {
            continue;
        }
        let (pipe_number, creature) = parse_single_spawn(spawn)?;
        entries.push(SpawnData {
            id: ids.allocate(),
            pipe_number,
            slugcats: slugcats.clone(),
            exclusive: false,
            is_lineage: false,
            creature,
            lineage: vec![LineageStep::placeholder()],
            written_clause: clause.clone(),
        });
    }
    Ok(SpawnLine {
        room: room.trim().to_ascii_uppercase(),
        entries,
    })
}

fn split_slugcat_clause<'a>(
    line: &'a str,
    roster: &[String],
) -> Result<(Option<SlugcatClause>, &'a str), SpawnParseError> {
    let Some(rest) = line.strip_prefix('(') else {
        return Ok((None, line));
    };
    let Some((clause, body)) = rest.split_once(')') else {
        return Err(SpawnParseError::UnclosedSlugcatClause {
            line: line.to_string(),
        });
    };
    let clause = clause.trim();
    let (exclusive, names) = match clause.strip_prefix("X-") {
        Some(names) => (true, names),
        None => (false, clause),
    };
    let listed: Vec<String> = names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    let resolved = if exclusive {
        roster
            .iter()
            .filter(|candidate| {
                !listed
                    .iter()
                    .any(|name| name.eq_ignore_ascii_case(candidate))
            })
            .cloned()
            .collect()
    } else {
        listed
    };
    let written = SlugcatClause {
        text: clause.to_string(),
        resolved,
    };
    Ok((Some(written), body))
}

fn parse_pipe(text: &str) -> Result<i32, SpawnParseError> {
    text.trim()
        .parse()
        .map_err(|_| SpawnParseError::BadPipe {
            text: text.trim().to_string(),
        })
}

/// `pipe-type[-tags|count][-count|tags]`
fn parse_single_spawn(text: &str) -> Result<(i32, CreatureSpawn), SpawnParseError> {
    let fields = split_top_level(text, '-');
    let malformed = || SpawnParseError::MalformedCreature {
        text: text.trim().to_string(),
    };
    if fields.len() < 2 || fields.len() > 4 {
        return Err(malformed());
    }
    let pipe_number = parse_pipe(fields[0])?;
    let creature_type = resolve_creature_alias(fields[1].trim());
    let (tags, amount) = split_tags_and_value(&fields[2..]).ok_or_else(malformed)?;
    let count = match amount {
        Some(amount) => amount.parse().map_err(|_| SpawnParseError::BadCount {
            text: amount.to_string(),
        })?,
        None => 1,
    };
    Ok((
        pipe_number,
        CreatureSpawn {
            creature_type,
            tags,
            count,
        },
    ))
}

/// `type[-tags]-chance` or `type-chance[-tags]`
fn parse_lineage_step(text: &str) -> Result<LineageStep, SpawnParseError> {
    let fields = split_top_level(text, '-');
    let malformed = || SpawnParseError::MalformedCreature {
        text: text.trim().to_string(),
    };
    if fields.len() < 2 || fields.len() > 3 {
        return Err(malformed());
    }
    let creature_type = resolve_creature_alias(fields[0].trim());
    let (tags, chance) = split_tags_and_value(&fields[1..]).ok_or_else(malformed)?;
    let chance_text = chance.ok_or_else(malformed)?;
    let chance = chance_text
        .parse()
        .map_err(|_| SpawnParseError::BadChance {
            text: chance_text.to_string(),
        })?;
    Ok(LineageStep {
        creature_type,
        tags,
        chance,
    })
}

/// A field starting with `{` is the tag field, any other is the numeric
/// field, in either order. Returns None on two fields of the same kind.
fn split_tags_and_value<'a>(fields: &[&'a str]) -> Option<(String, Option<&'a str>)> {
    let mut tags: Option<String> = None;
    let mut value: Option<&str> = None;
    for field in fields {
        let field = field.trim();
        if let Some(inner) = field.strip_prefix('{') {
            if tags.is_some() {
                return None;
            }
            tags = Some(inner.strip_suffix('}').unwrap_or(inner).to_string());
        } else {
            if value.is_some() {
                return None;
            }
            value = Some(field);
        }
    }
    Some((tags.unwrap_or_default(), value))
}

/// Splits on `separator` outside of `{...}` groups.
fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, ch) in text.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ if ch == separator && depth == 0 => {
                parts.push(&text[start..index]);
                start = index + ch.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

pub fn resolve_creature_alias(token: &str) -> String {
    let canonical = match token.to_ascii_lowercase().as_str() {
        "pink" | "pinklizard" => "PinkLizard",
        "green" | "greenlizard" => "GreenLizard",
        "blue" | "bluelizard" => "BlueLizard",
        "yellow" | "yellowlizard" => "YellowLizard",
        "white" | "whitelizard" => "WhiteLizard",
        "black" | "blacklizard" => "BlackLizard",
        "cyan" | "cyanlizard" => "CyanLizard",
        "red" | "redlizard" => "RedLizard",
        "spider" => "Spider",
        "smallcentipede" | "small centipede" => "SmallCentipede",
        "centi" | "centipede" => "Centipede",
        "redcenti" | "red centi" | "red centipede" | "redcentipede" => "RedCentipede",
        "dropwig" | "drop wig" | "drop bug" | "dropbug" => "DropBug",
        "big spider" | "bigspider" => "BigSpider",
        "spitter spider" | "spitterspider" => "SpitterSpider",
        "egg bug" | "eggbug" => "EggBug",
        "salamander" => "Salamander",
        "leech" => "Leech",
        "sea leech" | "sealeech" => "SeaLeech",
        "jet fish" | "jetfish" => "JetFish",
        "snail" => "Snail",
        "lev" | "leviathan" | "big eel" | "bigeel" => "BigEel",
        "cicada a" | "cicadaa" => "CicadaA",
        "cicada b" | "cicadab" => "CicadaB",
        "vulture" => "Vulture",
        "king vulture" | "kingvulture" => "KingVulture",
        "needle" | "needle worm" | "bigneedle" | "big needle" | "bigneedleworm" => {
            "BigNeedleWorm"
        }
        "small needle" | "smallneedle" | "smallneedleworm" => "SmallNeedleWorm",
        "centiwing" => "Centiwing",
        "cicada" => "Cicada",
        "mimic" | "pole mimic" | "polemimic" => "PoleMimic",
        "tentacle" | "tentacle plant" | "tentacleplant" => "TentaclePlant",
        "scavenger" => "Scavenger",
        "mouse" | "lantern mouse" | "lanternmouse" => "LanternMouse",
        "worm" | "garbage worm" | "garbageworm" => "GarbageWorm",
        "miros" | "miros bird" | "mirosbird" => "MirosBird",
        "tube" | "tube worm" | "tubeworm" => "TubeWorm",
        "bro" | "brolonglegs" | "bro long legs" | "brotherlonglegs" => "BrotherLongLegs",
        "daddy" | "daddy long legs" | "daddylonglegs" => "DaddyLongLegs",
        "deer" => "Deer",
        "caramel" | "spitlizard" => "SpitLizard",
        "eel" | "eellizard" => "EelLizard",
        "strawberry" | "zooplizard" => "ZoopLizard",
        "aqua centi" | "aquacentipede" | "aqua centipede" | "aquapede" | "aquacenti" => {
            "AquaCenti"
        }
        "mother spider" | "motherspider" => "MotherSpider",
        "yeek" => "Yeek",
        "jungleleech" => "JungleLeech",
        "miros vulture" | "mirosvulture" => "MirosVulture",
        "elite" | "scavenger elite" | "elitescavenger" | "elite scavenger" | "scavengerelite" => {
            "ScavengerElite"
        }
        "terror" | "mother" | "motherlonglegs" | "mother long legs" | "terror long legs"
        | "terrorlonglegs" => "TerrorLongLegs",
        "inspector" => "Inspector",
        "train" | "trainlizard" => "TrainLizard",
        "fire bug" | "hellbug" | "hell bug" | "firebug" => "FireBug",
        "hunter" | "hunter daddy" | "hunterdaddy" => "HunterDaddy",
        "blizzard" | "blizard" | "blizzard lizard" | "blizzardlizard" => "BlizzardLizard",
        "indigo" | "indigo lizard" | "skink" | "indigolizard" => "IndigoLizard",
        "big moth" | "bigmoth" => "BigMoth",
        "small moth" | "smallmoth" => "SmallMoth",
        "frog" => "Frog",
        "barnacle" => "Barnacle",
        "seapig" | "tardigrade" => "Tardigrade",
        "sky whale" | "skywhale" => "SkyWhale",
        "firesprite" => "FireSprite",
        "drillcrab" => "DrillCrab",
        "sandgrub" => "SandGrub",
        "bigsandgrub" => "BigSandGrub",
        "boxworm" => "BoxWorm",
        "rattler" => "Rattler",
        "templar" | "scavenger templar" | "templarscavenger" | "templar scavenger"
        | "scavengertemplar" => "ScavengerTemplar",
        "disciple" | "scavengerdisciple" | "scavenger disciple" | "disciplescavenger"
        | "disciple scavenger" => "ScavengerDisciple",
        "loach" => "Loach",
        "rotbehemoth" | "rot behemoth" | "rbehemoth" | "behemoth" | "bigrot" | "rotloach" => {
            "RotLoach"
        }
        "rat" => "Rat",
        "none" => NONE_CREATURE,
        _ => return token.to_string(),
    };
    canonical.to_string()
}

/// Next creature name in [`CREATURE_TYPES`], wrapping; unknown names start
/// from the beginning.
pub fn next_creature_type(current: &str) -> &'static str {
    let position = CREATURE_TYPES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(current));
    match position {
        Some(index) => CREATURE_TYPES[(index + 1) % CREATURE_TYPES.len()],
        None => CREATURE_TYPES[0],
    }
}

fn slugcat_prefix(entry: &SpawnData) -> String {
    let Some(names) = &entry.slugcats else {
        return String::new();
    };
    match &entry.written_clause {
        Some(clause) if clause.resolved == *names => format!("({})", clause.text),
        _ if entry.exclusive => format!("(X-{})", names.join(",")),
        _ => format!("({})", names.join(",")),
    }
}

fn format_tags(tags: &str) -> String {
    format!("{{{tags}}}")
}

fn format_single(entry: &SpawnData) -> String {
    let creature = &entry.creature;
    let mut text = format!("{}-{}", entry.pipe_number, creature.creature_type);
    if !creature.tags.is_empty() {
        text.push('-');
        text.push_str(&format_tags(&creature.tags));
    }
    if creature.count != 1 {
        text.push_str(&format!("-{}", creature.count));
    }
    text
}

fn format_lineage(room: &str, entry: &SpawnData) -> String {
    let steps: Vec<String> = entry
        .lineage
        .iter()
        .map(|step| {
            if step.tags.is_empty() {
                format!("{}-{}", step.creature_type, step.chance)
            } else {
                format!(
                    "{}-{}-{}",
                    step.creature_type,
                    format_tags(&step.tags),
                    step.chance
                )
            }
        })
        .collect();
    format!(
        "{}{LINEAGE_KEYWORD} : {room} : {} : {}",
        slugcat_prefix(entry),
        entry.pipe_number,
        steps.join(", ")
    )
}

/// Canonical text for a room's spawn entries. Single spawns sharing a
/// slugcat clause share a line; every lineage gets its own line.
/// Placeholder entries are skipped.
pub fn format_spawn_lines(room: &str, entries: &[SpawnData]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut single_groups: Vec<(String, Vec<String>)> = Vec::new();
    for entry in entries.iter().filter(|entry| !entry.is_placeholder()) {
        if entry.is_lineage {
            lines.push(format_lineage(room, entry));
            continue;
        }
        let prefix = slugcat_prefix(entry);
        let spawn = format_single(entry);
        match single_groups.iter_mut().find(|(group, _)| *group == prefix) {
            Some((_, spawns)) => spawns.push(spawn),
            None => single_groups.push((prefix, vec![spawn])),
        }
    }
    let mut singles: Vec<String> = single_groups
        .into_iter()
        .map(|(prefix, spawns)| format!("{prefix}{room} : {}", spawns.join(", ")))
        .collect();
    singles.append(&mut lines);
    singles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn parse(line: &str) -> Result<SpawnLine, SpawnParseError> {
        parse_spawn_line(
            line,
            &roster(&DEFAULT_SLUGCATS),
            &mut SpawnIdAllocator::default(),
        )
    }

    #[test]
    fn single_spawn_with_tags_and_count() {
        let parsed = parse("DEN1 : 2-PinkLizard-{nocturnal}-3").expect("parse");
        assert_eq!(parsed.room, "DEN1");
        let entry = &parsed.entries[0];
        assert_eq!(entry.pipe_number, 2);
        assert!(!entry.is_lineage);
        assert_eq!(entry.creature.creature_type, "PinkLizard");
        assert_eq!(entry.creature.tags, "nocturnal");
        assert_eq!(entry.creature.count, 3);
    }

    #[test]
    fn count_may_precede_tags() {
        let parsed = parse("SU_A01 : 4-Yellow-2-{Mean:0.5}").expect("parse");
        let creature = &parsed.entries[0].creature;
        assert_eq!(creature.creature_type, "YellowLizard");
        assert_eq!(creature.tags, "Mean:0.5");
        assert_eq!(creature.count, 2);
    }

    #[test]
    fn one_entry_per_listed_creature_sharing_clause() {
        let parsed = parse("(White,Red)SU_A02 : 3-pink, 4-Green-2, 5-Snail").expect("parse");
        assert_eq!(parsed.entries.len(), 3);
        let pipes: Vec<i32> = parsed.entries.iter().map(|entry| entry.pipe_number).collect();
        assert_eq!(pipes, vec![3, 4, 5]);
        for entry in &parsed.entries {
            assert_eq!(entry.slugcats, Some(roster(&["White", "Red"])));
        }
        assert_ne!(parsed.entries[0].id, parsed.entries[1].id);
    }

    #[test]
    fn exclusive_clause_resolves_to_complement() {
        let mut ids = SpawnIdAllocator::default();
        let parsed = parse_spawn_line(
            "(X-White,Yellow)SU_A03 : 2-Pink",
            &roster(&["White", "Yellow", "Red"]),
            &mut ids,
        )
        .expect("parse");
        let entry = &parsed.entries[0];
        assert_eq!(entry.slugcats, Some(roster(&["Red"])));
        assert!(!entry.exclusive);
        assert!(entry.applies_to("red"));
        assert!(!entry.applies_to("White"));
    }

    #[test]
    fn lineage_accepts_tags_on_either_side_of_chance() {
        let parsed =
            parse("LINEAGE : su_b04 : 3 : Pink-{Mean:1}-0.2, Green-0.5-{Night}, Red-0").expect("parse");
        assert_eq!(parsed.room, "SU_B04");
        let entry = &parsed.entries[0];
        assert!(entry.is_lineage);
        assert_eq!(entry.pipe_number, 3);
        assert_eq!(entry.creature.creature_type, NONE_CREATURE);
        let steps: Vec<(&str, &str, f32)> = entry
            .lineage
            .iter()
            .map(|step| (step.creature_type.as_str(), step.tags.as_str(), step.chance))
            .collect();
        assert_eq!(
            steps,
            vec![
                ("PinkLizard", "Mean:1", 0.2),
                ("GreenLizard", "Night", 0.5),
                ("RedLizard", "", 0.0)
            ]
        );
    }

    #[test]
    fn numeric_failures_are_line_errors() {
        assert_eq!(
            parse("SU_A01 : x-Pink"),
            Err(SpawnParseError::BadPipe {
                text: "x".to_string()
            })
        );
        assert_eq!(
            parse("LINEAGE : SU_A01 : 2 : Pink-often"),
            Err(SpawnParseError::BadChance {
                text: "often".to_string()
            })
        );
        assert_eq!(
            parse("SU_A01 : 2-Pink-many"),
            Err(SpawnParseError::BadCount {
                text: "many".to_string()
            })
        );
        assert!(matches!(
            parse("(White SU_A01 : 2-Pink"),
            Err(SpawnParseError::UnclosedSlugcatClause { .. })
        ));
    }

    #[test]
    fn unknown_alias_passes_through() {
        assert_eq!(resolve_creature_alias("ModdedBeast"), "ModdedBeast");
        assert_eq!(resolve_creature_alias("yellowlizard"), "YellowLizard");
        assert_eq!(resolve_creature_alias("CYAN"), "CyanLizard");
    }

    #[test]
    fn formatting_groups_singles_and_skips_placeholders() {
        let mut ids = SpawnIdAllocator::default();
        let roster = roster(&DEFAULT_SLUGCATS);
        let mut entries = parse_spawn_line("SU_A01 : 2-Pink-{Night}-3, 4-Snail", &roster, &mut ids)
            .expect("singles")
            .entries;
        entries.extend(
            parse_spawn_line("(Red)LINEAGE : SU_A01 : 5 : Pink-0.5, Red-0", &roster, &mut ids)
                .expect("lineage")
                .entries,
        );
        entries.push(SpawnData::placeholder(ids.allocate(), 6));

        assert_eq!(
            format_spawn_lines("SU_A01", &entries),
            vec![
                "SU_A01 : 2-PinkLizard-{Night}-3, 4-Snail".to_string(),
                "(Red)LINEAGE : SU_A01 : 5 : PinkLizard-0.5, RedLizard-0".to_string(),
            ]
        );
    }

    #[test]
    fn exclusive_clause_keeps_its_written_form_until_the_set_changes() {
        let mut ids = SpawnIdAllocator::default();
        let roster = roster(&["White", "Yellow", "Red"]);
        let mut entries = parse_spawn_line("(X-White,Yellow)SU_A03 : 2-Pink", &roster, &mut ids)
            .expect("parse")
            .entries;
        entries[0].creature.count = 2;
        assert_eq!(
            format_spawn_lines("SU_A03", &entries),
            vec!["(X-White,Yellow)SU_A03 : 2-PinkLizard-2".to_string()]
        );

        entries[0].slugcats = Some(vec!["Red".to_string(), "White".to_string()]);
        assert_eq!(
            format_spawn_lines("SU_A03", &entries),
            vec!["(Red,White)SU_A03 : 2-PinkLizard-2".to_string()]
        );
    }

    #[test]
    fn toggling_lineage_carries_the_creature_across() {
        let mut ids = SpawnIdAllocator::default();
        let mut entry = parse_spawn_line("SU_A01 : 2-Pink-{Night}-2", &roster(&["White"]), &mut ids)
            .expect("parse")
            .entries
            .remove(0);

        entry.toggle_lineage();
        assert!(entry.is_lineage);
        assert!(!entry.is_placeholder());
        assert_eq!(entry.lineage[0].creature_type, "PinkLizard");
        assert_eq!(entry.lineage[0].tags, "Night");
        assert_eq!(
            format_spawn_lines("SU_A01", &[entry.clone()]),
            vec!["LINEAGE : SU_A01 : 2 : PinkLizard-{Night}-0".to_string()]
        );

        entry.toggle_lineage();
        assert!(!entry.is_lineage);
        assert_eq!(entry.creature.count, 2);

        let mut lineage = parse_spawn_line(
            "LINEAGE : SU_A01 : 4 : Red-0.2, Cyan-0",
            &roster(&["White"]),
            &mut ids,
        )
        .expect("lineage")
        .entries
        .remove(0);
        lineage.toggle_lineage();
        assert_eq!(lineage.creature.creature_type, "RedLizard");
        assert!(!lineage.is_placeholder());
    }

    #[test]
    fn content_eq_ignores_id() {
        let a = SpawnData::placeholder(SpawnId(1), 3);
        let b = SpawnData::placeholder(SpawnId(2), 3);
        assert!(a.content_eq(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn creature_cycle_wraps() {
        assert_eq!(next_creature_type(NONE_CREATURE), "PinkLizard");
        assert_eq!(next_creature_type("Rat"), NONE_CREATURE);
        assert_eq!(next_creature_type("Unknown"), NONE_CREATURE);
    }
}

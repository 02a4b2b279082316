//! Built-in taxonomy used when no taxonomy file is available.
//!
//! A compact combat/arena sound-effect set: weapons, impacts, foley,
//! vocals, crowd, environment and UI.

/// `(key, description)` pairs in display order.
pub const BUILTIN_LABELS: &[(&str, &str)] = &[
    (
        "melee_sword_slash_light",
        "short metal sword slash, close combat, gladius cutting air or light armor, dry, close mic",
    ),
    (
        "melee_sword_slash_heavy",
        "heavy metal sword swing with strong impact, brutal gladiator strike, lots of low mid energy",
    ),
    (
        "melee_spear_thrust",
        "fast spear or javelin thrust, sharp attack transient, point piercing target",
    ),
    (
        "melee_mace_blunt",
        "blunt metal mace hit on armor, heavy low thump with metallic clank",
    ),
    (
        "hit_armor_metal_light",
        "light impact on metal armor, small shield tap, subtle metallic ring",
    ),
    (
        "hit_armor_metal_heavy",
        "strong metal impact on armor or shield, loud clang and ring, gladiator blocking attack",
    ),
    (
        "hit_flesh_light",
        "light flesh hit, muted wet thud, little or no armor",
    ),
    (
        "hit_flesh_heavy",
        "heavy body impact with flesh and bone, thick low frequency thump, possible gore",
    ),
    (
        "shield_block_wood",
        "wooden shield block, woody thud with small rattle, roman scutum",
    ),
    (
        "shield_block_metal",
        "metal shield block, plate clash, ringing edge",
    ),
    (
        "footstep_sand",
        "human footsteps on sand or dirt arena floor, soft granular scrapes",
    ),
    (
        "footstep_stone",
        "sandaled footsteps on stone, hard clicks and small reverbs, coliseum corridors",
    ),
    (
        "vocal_battle_shout",
        "single male gladiator battle shout or yell, aggressive voice, medium reverb",
    ),
    (
        "vocal_pain_cry",
        "human pain scream or grunt, hurt vocalization in combat",
    ),
    (
        "crowd_cheer_large",
        "large ancient roman coliseum crowd cheering, wide stereo ambience, wall of voices",
    ),
    (
        "crowd_boo",
        "crowd booing or disapproving, descending vocal reactions",
    ),
    (
        "crowd_murmur_idle",
        "large crowd idle murmur, distant talking ambience, no big cheer",
    ),
    (
        "environment_fire",
        "fire or torches burning, crackling flames, medieval ambience",
    ),
    (
        "environment_chain_rattle",
        "chains rattling, metal links clanking, dungeon like",
    ),
    (
        "ui_menu",
        "short clean user interface click or confirm sound, non diegetic, no ambience",
    ),
    (
        "ui_error",
        "short clean user interface error or cancel sound, non diegetic",
    ),
];

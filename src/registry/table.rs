//! Builtin quirk groups.
//!
//! Each entry names one non-default handling rule and the titles it applies
//! to.  Adding a title or a group is a data change here; the registry logic
//! never special-cases a group name.

/// `(group name, member title ids)`.
pub type QuirkTable = &'static [(&'static str, &'static [&'static str])];

pub const BUILTIN_QUIRKS: QuirkTable = &[
    ("gtav",        &["CUSA00411", "CUSA00419", "CUSA00880"]),
    ("rdr2",        &["CUSA03041", "CUSA08519", "CUSA08568", "CUSA15698"]),
    ("xeno2",       &["CUSA05350", "CUSA05088", "CUSA04904", "CUSA05085", "CUSA05774"]),
    ("bl3",         &["CUSA07823", "CUSA08025"]),
    ("wonderlands", &["CUSA23766", "CUSA23767"]),
    ("ndog", &[
        // the last of us remastered
        "CUSA00557", "CUSA00559", "CUSA00552", "CUSA00556", "CUSA00554",
        // uncharted 4
        "CUSA00341", "CUSA00917", "CUSA00918", "CUSA04529", "CUSA00912",
        // uncharted: the lost legacy
        "CUSA07875", "CUSA09564", "CUSA07737", "CUSA08347", "CUSA08352",
    ]),
    ("ndog_col",    &["CUSA02344", "CUSA02343", "CUSA02826", "CUSA02320", "CUSA01399"]),
    ("ndog_tlou2",  &["CUSA07820", "CUSA10249", "CUSA13986", "CUSA14006"]),
    ("mgsv_tpp",    &["CUSA01140", "CUSA01154", "CUSA01099"]),
    ("mgsv_gz",     &["CUSA00218", "CUSA00211", "CUSA00225"]),
    ("rev2",        &["CUSA00924", "CUSA01133", "CUSA01141", "CUSA00804"]),
    ("re7",         &["CUSA03842", "CUSA03962", "CUSA09473", "CUSA09643", "CUSA09993"]),
    ("reres",       &["CUSA14122", "CUSA14169", "CUSA16725"]),
    ("dl1",         &["CUSA00050", "CUSA02010", "CUSA03991", "CUSA03946", "CUSA00078"]),
    ("dl2",         &["CUSA12555", "CUSA12584", "CUSA28617", "CUSA28743"]),
    ("rgg",         &["CUSA32173", "CUSA32174", "CUSA32171"]),
    ("di1",         &["CUSA03291", "CUSA03290", "CUSA03684", "CUSA03685"]),
    ("di2",         &["CUSA27043", "CUSA01104", "CUSA35681"]),
    ("nms",         &["CUSA03952", "CUSA04841", "CUSA05777", "CUSA05965"]),
    ("terraria",    &["CUSA00737", "CUSA00740"]),
    ("smt5",        &["CUSA42697", "CUSA42698"]),
    ("rcube",       &["CUSA16074", "CUSA27390"]),
    ("dsr",         &["CUSA08692", "CUSA08495", "CUSA08526", "CUSA11771", "CUSA11315", "CUSA11299"]),
    ("re4r",        &["CUSA33388", "CUSA33387", "CUSA35714"]),
];

// Sidecar-to-file name matching rules
//
// The export mangles names in several distinct ways, from truncation at
// 46 UTF-16 units to the sequence numbers and locale suffixes added to
// duplicates and edited copies. Each rule below recognizes one of them.
// A rule takes the sidecar's base name and a candidate file's base name
// and decides whether the file belongs to that sidecar.

use crate::mime;

pub type MatcherFn = fn(&str, &str) -> bool;

/// The rules, most specific first. Order is load-bearing: the later rules
/// are broader and would steal matches from the earlier ones.
pub const MATCHERS: [MatcherFn; 6] = [
    exact,
    one_codepoint_short,
    very_long_with_sequence,
    duplicate_in_year,
    edited_variant,
    forgotten_duplicates,
];

/// Extension including the dot, from the last dot to the end. `.json`
/// counts as an extension even with nothing before the dot; no dot means
/// no extension. Matcher arithmetic was calibrated against these suffix
/// rules, not against `Path::extension`.
pub(crate) fn ext_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) => &name[i..],
        None => "",
    }
}

pub(crate) fn trim_ext(name: &str) -> &str {
    &name[..name.len() - ext_of(name).len()]
}

/// PXL_20230922_144936660.jpg.json
/// PXL_20230922_144936660.jpg
pub fn exact(json_name: &str, file_name: &str) -> bool {
    trim_ext(json_name) == file_name
}

/// PXL_20230809_203449253.LONG_EXPOSURE-02.ORIGIN.json
/// PXL_20230809_203449253.LONG_EXPOSURE-02.ORIGINA.jpg
///
/// 05yqt21kruxwwlhhgrwrdyb6chhwszi9bqmzu16w0 2.jp.json
/// 05yqt21kruxwwlhhgrwrdyb6chhwszi9bqmzu16w0 2.jpg
///
/// The name cap can also cut into an embedded extension; that inner
/// extension is stripped only when it still reads as a truncated media
/// extension, so suffixes like .ORIGINAL or .COVER stay part of the stem.
pub fn one_codepoint_short(json_name: &str, file_name: &str) -> bool {
    let mut base = trim_ext(json_name);
    if !file_name.starts_with(base) {
        return false;
    }
    if mime::is_extension_prefix(ext_of(base)) {
        base = trim_ext(base);
    }
    let file_stem = trim_ext(file_name);
    let file_len = file_stem.chars().count() as isize;
    let base_len = base.chars().count() as isize;
    file_len - base_len <= 1
}

/// Backyard_ceremony_wedding_photography_xxxxxxx_(494).json
/// Backyard_ceremony_wedding_photography_xxxxxxx_m(494).jpg
///
/// One character was inserted between the truncated prefix and the
/// sequence number.
pub fn very_long_with_sequence(json_name: &str, file_name: &str) -> bool {
    let json_name = trim_ext(json_name);
    let p1_json = match json_name.find('(') {
        Some(i) => i,
        None => return false,
    };
    let p2_json = match json_name.find(')') {
        Some(i) => i,
        None => return false,
    };
    if p2_json != json_name.len() - 1 {
        return false;
    }
    let p1_file = match file_name.find('(') {
        Some(i) => i,
        None => return false,
    };
    if p1_file != p1_json + 1 {
        return false;
    }
    if json_name.get(..p1_json) != file_name.get(..p1_json) {
        return false;
    }
    let p2_file = match file_name.find(')') {
        Some(i) => i,
        None => return false,
    };
    if p2_file <= p1_file {
        return false;
    }
    json_name[p1_json + 1..p2_json] == file_name[p1_file + 1..p2_file]
}

/// IMG_3479.JPG(2).json
/// IMG_3479(2).JPG
///
/// The duplicate counter moves from after the extension to before it.
pub fn duplicate_in_year(json_name: &str, file_name: &str) -> bool {
    let json_name = trim_ext(json_name);
    let p1 = match json_name.find('(') {
        Some(i) if i >= 1 => i,
        _ => return false,
    };
    let p2 = match json_name.find(')') {
        Some(i) => i,
        None => return false,
    };
    if p2 != json_name.len() - 1 {
        return false;
    }
    let num = &json_name[p1..];
    let stem = &json_name[..p1];
    let ext = ext_of(stem);
    let rebuilt = format!("{}{}{}", &stem[..stem.len() - ext.len()], num, ext);
    rebuilt == file_name
}

/// PXL_20220405_090123740.PORTRAIT.jpg.json
/// PXL_20220405_090123740.PORTRAIT.jpg
/// PXL_20220405_090123740.PORTRAIT-modifié.jpg
///
/// Edited copies keep the stem and add a locale suffix.
pub fn edited_variant(json_name: &str, file_name: &str) -> bool {
    let base = trim_ext(json_name);
    let ext = ext_of(base);
    if ext.is_empty() {
        return false;
    }
    if mime::media_type_from_ext(ext).is_err() {
        return false;
    }
    let base = &base[..base.len() - ext.len()];
    let file_stem = trim_ext(file_name);
    file_stem.starts_with(base)
}

/// original_1d4caa6f-16c6-4c3d-901b-9387de10e528_.json
/// original_1d4caa6f-16c6-4c3d-901b-9387de10e528_P.jpg
/// original_1d4caa6f-16c6-4c3d-901b-9387de10e528_P(1).jpg
// TODO: this rule can interfere with very_long_with_sequence when a
// leftover name carries a "(N)" suffix; it needs a guard for that shape.
pub fn forgotten_duplicates(json_name: &str, file_name: &str) -> bool {
    let json_stem = trim_ext(json_name);
    let file_stem = trim_ext(file_name);
    if !file_stem.starts_with(json_stem) {
        return false;
    }
    let json_len = json_stem.chars().count() as isize;
    let file_len = file_stem.chars().count() as isize;
    file_len - json_len < 10
}

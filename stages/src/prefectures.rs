use stagehand_lib::Owner;

/// The 47 Japanese prefectures, in their conventional English names. Stands
/// in for the original system's `Prefecture.get_all()` database lookup: the
/// owner roster used by `DomainRunners::health_check` to enumerate
/// per-prefecture tasks.
pub const PREFECTURE_NAMES: [&str; 47] = [
    "Hokkaido",
    "Aomori",
    "Iwate",
    "Miyagi",
    "Akita",
    "Yamagata",
    "Fukushima",
    "Ibaraki",
    "Tochigi",
    "Gunma",
    "Saitama",
    "Chiba",
    "Tokyo",
    "Kanagawa",
    "Niigata",
    "Toyama",
    "Ishikawa",
    "Fukui",
    "Yamanashi",
    "Nagano",
    "Gifu",
    "Shizuoka",
    "Aichi",
    "Mie",
    "Shiga",
    "Kyoto",
    "Osaka",
    "Hyogo",
    "Nara",
    "Wakayama",
    "Tottori",
    "Shimane",
    "Okayama",
    "Hiroshima",
    "Yamaguchi",
    "Tokushima",
    "Kagawa",
    "Ehime",
    "Kochi",
    "Fukuoka",
    "Saga",
    "Nagasaki",
    "Kumamoto",
    "Oita",
    "Miyazaki",
    "Kagoshima",
    "Okinawa",
];

pub fn all_prefectures() -> Vec<Owner> {
    PREFECTURE_NAMES.iter().map(|name| Owner::from(*name)).collect()
}

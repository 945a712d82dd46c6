//! Safe-Search rewriting of known search-engine hosts.
//!
//! A static table maps search-engine frontends to their force-safe
//! equivalents. Lookups expect normalized (lowercased) hostnames.

use ahash::AHashMap;
use once_cell::sync::Lazy;

/// Country domains under which Google serves search.
const GOOGLE_TLDS: &[&str] = &[
    "com", "ad", "ae", "com.af", "com.ag", "com.ar", "com.au", "at", "az", "ba", "com.bd", "be",
    "bg", "com.bh", "com.bo", "com.br", "by", "ca", "ch", "ci", "cl", "com.co", "co.cr", "cz",
    "de", "dk", "com.do", "com.ec", "ee", "com.eg", "es", "fi", "fr", "gr", "com.gt", "com.hk",
    "hr", "hu", "co.id", "ie", "co.il", "co.in", "iq", "is", "it", "com.jm", "jo", "co.jp",
    "co.ke", "kg", "co.kr", "com.kw", "kz", "lt", "lu", "lv", "com.mx", "com.my", "com.ng",
    "nl", "no", "com.np", "co.nz", "com.pe", "com.ph", "com.pk", "pl", "pt", "com.py", "com.qa",
    "ro", "rs", "ru", "com.sa", "se", "com.sg", "si", "sk", "com.tr", "com.tw", "com.ua",
    "co.uk", "com.uy", "co.ve", "co.za",
];

/// Country domains under which Yandex serves search.
const YANDEX_TLDS: &[&str] = &["ru", "com", "com.tr", "by", "kz", "ua"];

static SAFE_SEARCH_HOSTS: Lazy<AHashMap<String, &'static str>> = Lazy::new(|| {
    let mut hosts = AHashMap::new();

    for tld in GOOGLE_TLDS {
        hosts.insert(format!("www.google.{}", tld), "forcesafesearch.google.com");
    }
    for tld in YANDEX_TLDS {
        hosts.insert(format!("yandex.{}", tld), "familysearch.yandex.ru");
    }

    hosts.insert("www.bing.com".to_string(), "strict.bing.com");
    hosts.insert("duckduckgo.com".to_string(), "safe.duckduckgo.com");
    hosts.insert("www.duckduckgo.com".to_string(), "safe.duckduckgo.com");

    hosts.insert("www.youtube.com".to_string(), "restrictmoderate.youtube.com");
    hosts.insert("m.youtube.com".to_string(), "restrictmoderate.youtube.com");
    hosts.insert(
        "youtubei.googleapis.com".to_string(),
        "restrictmoderate.youtube.com",
    );
    hosts.insert(
        "www.youtube-nocookie.com".to_string(),
        "restrictmoderate.youtube.com",
    );

    hosts
});

/// Force-safe replacement for `host`, if it is a known search frontend.
pub(crate) fn lookup(host: &str) -> Option<&'static str> {
    SAFE_SEARCH_HOSTS.get(host).copied()
}

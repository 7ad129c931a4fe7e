// Root index.html: ?lang, then localStorage, then navigator.languages, then the default

use crate::html::html_escape;
use multilocale_core::{LocaleSet, PageKey, RouteTable};
use serde_json::{Map, Value};

/// `localStorage` key holding the visitor's last explicit choice
pub const PREFERENCE_KEY: &str = "preferred-locale";

/// Home URL of every locale: its `index` route, else `/<locale>/`.
pub fn locale_homes(locales: &LocaleSet, routes: &RouteTable) -> Vec<(String, String)> {
    let index = PageKey::index();
    locales
        .iter()
        .map(|locale| {
            let home = routes
                .resolve_path(&index, locale)
                .map(str::to_string)
                .unwrap_or_else(|| format!("/{locale}/"));
            (locale.to_string(), home)
        })
        .collect()
}

pub fn root_redirect_page(locales: &LocaleSet, routes: &RouteTable) -> String {
    let homes = locale_homes(locales, routes);
    let default = locales.default_locale().as_str();
    let default_home = homes
        .iter()
        .find(|(code, _)| code == default)
        .map(|(_, home)| home.clone())
        .unwrap_or_else(|| format!("/{default}/"));

    let homes_json = Value::Object(
        homes
            .into_iter()
            .map(|(code, home)| (code, Value::String(home)))
            .collect::<Map<_, _>>(),
    )
    .to_string()
    .replace("</", "<\\/");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Redirecting…</title>
  <noscript><meta http-equiv="refresh" content="0; url={home_attr}"></noscript>
  <script>
    (function () {{
      var homes = {homes_json};
      var fallback = "{default}";
      function pick(code) {{
        code = (code || "").slice(0, 2).toLowerCase();
        return Object.prototype.hasOwnProperty.call(homes, code) ? code : null;
      }}
      var locale = pick(new URLSearchParams(window.location.search).get("lang"));
      if (!locale) {{
        try {{ locale = pick(window.localStorage.getItem("{PREFERENCE_KEY}")); }} catch (e) {{}}
      }}
      if (!locale) {{
        var langs = navigator.languages || [navigator.language];
        for (var i = 0; i < langs.length && !locale; i++) locale = pick(langs[i]);
      }}
      window.location.replace(homes[locale || fallback]);
    }})();
  </script>
</head>
<body>
  <p>Redirecting…</p>
  <p><a href="{home_attr}">Continue to site</a></p>
</body>
</html>
"#,
        home_attr = html_escape(&default_home),
    )
}

use anyhow::{Context, Result};
use multilocale_core::CONFIG_FILE;
use std::fs;
use std::path::{Path, PathBuf};

const SITE_TOML: &str = r#"# Site configuration
# Paths are relative to this file.

[site]
base_url = "https://example.com"
default_locale = "en"
locales = ["en", "fr"]
# rtl_locales = ["ar", "fa", "he", "ur"]

[paths]
pages = "src/pages"
layouts = "src/layouts"
partials = "src/partials"
data = "src/data"
routes = "src/data/routes.json"
output = "dist"

[build]
template_extension = "njk"
sitemap = true
not_found = true
# "safety-net" localizes raw root-relative links, "off" leaves them alone
link_rewrite = "safety-net"

[[assets]]
name = "style"
kind = "style"
source = "src/assets/main.css"
"#;

const BASE_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="{{ locale }}" dir="{{ dir }}">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{% block title %}{{ t("site.name") }}{% endblock %}</title>
  <link rel="stylesheet" href="{{ assets.style }}">
  {%- for alt in alternates %}
  <link rel="alternate" hreflang="{{ alt.locale }}" href="{{ alt.url }}">
  {%- endfor %}
</head>
<body>
  {% include "nav.njk" %}
  <main>
    {% block content %}{% endblock %}
  </main>
  <footer>{{ t("footer.note", {"name": t("site.name")}) }}</footer>
</body>
</html>
"#;

const NAV_PARTIAL: &str = r#"<nav>
  <ul>
  {%- for item in navigation %}
    <li><a href="{{ item.url }}"{% if item.active %} aria-current="page"{% endif %}>{{ item.title }}</a></li>
  {%- endfor %}
  </ul>
  <ul class="languages">
  {%- for code in locales %}
    <li><a href="{{ localizedUrl(pageKey, code) }}" hreflang="{{ code }}" onclick="try { localStorage.setItem('preferred-locale', '{{ code }}') } catch (e) {}"{% if isCurrentLocale(code) %} aria-current="true"{% endif %}>{{ code|upper }}</a></li>
  {%- endfor %}
  </ul>
</nav>
"#;

const INDEX_PAGE: &str = r#"{% extends "base.njk" %}
{% block content %}
<h1>{{ t("home.title") }}</h1>
<p>{{ t("home.intro") }}</p>
<p><a href="{{ routeFor('about') }}">{{ t("home.more") }}</a></p>
{% endblock %}
"#;

const ABOUT_PAGE: &str = r#"{% extends "base.njk" %}
{% block title %}{{ t("about.title") }}{% endblock %}
{% block content %}
<h1>{{ t("about.title") }}</h1>
<p>{{ t("about.body") }}</p>
{% endblock %}
"#;

const ABOUT_PAGE_FR: &str = r#"{% extends "base.njk" %}
{% block title %}{{ t("about.title") }}{% endblock %}
{% block content %}
<h1>{{ t("about.title") }}</h1>
<p>{{ t("about.body") }}</p>
<p>Cette page utilise un modèle propre au français.</p>
{% endblock %}
"#;

const NOT_FOUND_PAGE: &str = r#"{% extends "base.njk" %}
{% block title %}{{ t("notFound.title") }}{% endblock %}
{% block content %}
<h1>{{ t("notFound.title") }}</h1>
<p>{{ t("notFound.message") }}</p>
<p><a href="{{ routeFor('index') }}">{{ t("notFound.home") }}</a></p>
{% endblock %}
"#;

const EN_DATA: &str = r#"{
  "site": { "name": "My Site" },
  "footer": { "note": "Built with {{name}}" },
  "home": {
    "title": "Welcome",
    "intro": "This site is available in several languages.",
    "more": "Learn more"
  },
  "about": {
    "title": "About",
    "body": "Tell visitors who you are."
  },
  "notFound": {
    "title": "Page not found",
    "message": "The page you are looking for does not exist.",
    "home": "Go to the home page"
  }
}
"#;

const FR_DATA: &str = r#"{
  "site": { "name": "Mon site" },
  "footer": { "note": "Construit avec {{name}}" },
  "home": {
    "title": "Bienvenue",
    "intro": "Ce site est disponible en plusieurs langues.",
    "more": "En savoir plus"
  },
  "about": {
    "title": "À propos",
    "body": "Présentez-vous à vos visiteurs."
  },
  "notFound": {
    "title": "Page introuvable",
    "message": "La page que vous cherchez n'existe pas.",
    "home": "Retour à l'accueil"
  }
}
"#;

const ROUTES: &str = r#"{
  "routes": {
    "en": [
      { "key": "index", "path": "/en/", "title": "Home" },
      { "key": "about", "path": "/en/about/", "title": "About" }
    ],
    "fr": [
      { "key": "index", "path": "/fr/", "title": "Accueil" },
      { "key": "about", "path": "/fr/a-propos/", "title": "À propos" }
    ]
  }
}
"#;

const MAIN_CSS: &str = r#"body {
  font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
  line-height: 1.6;
  max-width: 48rem;
  margin: 0 auto;
  padding: 2rem;
}

nav ul {
  display: flex;
  gap: 1rem;
  list-style: none;
  padding: 0;
}

[aria-current] {
  font-weight: bold;
}
"#;

/// Every file of the starter site, relative to the site root
const STARTER_FILES: &[(&str, &str)] = &[
    (CONFIG_FILE, SITE_TOML),
    ("src/layouts/base.njk", BASE_LAYOUT),
    ("src/partials/nav.njk", NAV_PARTIAL),
    ("src/pages/index.njk", INDEX_PAGE),
    ("src/pages/about.njk", ABOUT_PAGE),
    ("src/pages/about.fr.njk", ABOUT_PAGE_FR),
    ("src/pages/404.njk", NOT_FOUND_PAGE),
    ("src/data/en.json", EN_DATA),
    ("src/data/fr.json", FR_DATA),
    ("src/data/routes.json", ROUTES),
    ("src/assets/main.css", MAIN_CSS),
];

/// Create a starter two-locale site in `path`
pub async fn run(path: PathBuf) -> Result<()> {
    println!("🌍 Creating site in {}", path.display());

    scaffold(&path)?;

    println!("   ✓ Created {} files", STARTER_FILES.len());
    println!();
    println!("Next steps:");
    println!("  multilocale preview {}", path.display());
    println!("  multilocale build {}", path.display());

    Ok(())
}

fn scaffold(base: &Path) -> Result<()> {
    let config_path = base.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!("{} already exists; refusing to overwrite", config_path.display());
    }

    for (relative, content) in STARTER_FILES {
        let target = base.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&target, content).with_context(|| format!("Failed to write {}", target.display()))?;
    }

    Ok(())
}

use leptos::prelude::*;

struct NavLink {
    label: &'static str,
    href: &'static str,
}

struct NavSection {
    title: &'static str,
    links: &'static [NavLink],
}

const NAV_SECTIONS: &[NavSection] = &[
    NavSection {
        title: "General",
        links: &[
            NavLink {
                label: "Dashboard",
                href: "/dashboard",
            },
            NavLink {
                label: "Users",
                href: "/users",
            },
        ],
    },
    NavSection {
        title: "Automation",
        links: &[
            NavLink {
                label: "Forms",
                href: "/forms",
            },
            NavLink {
                label: "Automation",
                href: "/automation",
            },
        ],
    },
];

#[component]
pub fn Sidebar() -> impl IntoView {
    view! {
        <aside class="sidebar">
            {NAV_SECTIONS
                .iter()
                .map(|section| {
                    view! {
                        <div class="nav-section">
                            <p class="nav-section-title">{section.title}</p>
                            <ul>
                                {section
                                    .links
                                    .iter()
                                    .map(|link| {
                                        view! {
                                            <li>
                                                <a href=link.href>{link.label}</a>
                                            </li>
                                        }
                                    })
                                    .collect_view()}
                            </ul>
                        </div>
                    }
                })
                .collect_view()}
        </aside>
    }
}

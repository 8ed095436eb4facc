//! Fixed option lists offered to the user.

/// A titled group of activities.
#[derive(Debug, Clone, Copy)]
pub struct ActivitySection {
    pub title: &'static str,
    pub items: &'static [&'static str],
}

pub const LOCATIONS: &[&str] = &[
    "Home",
    "Work",
    "Car",
    "Out",
    "Front Room",
    "Bedroom",
    "Kitchen",
    "Bathroom",
    "Porch",
    "Yard",
    "Garage",
    "Office",
    "Store",
    "Restaurant",
    "Gym",
    "Friend House",
    "Family House",
    "Other",
];

pub const MOVEMENTS: &[&str] = &[
    "Stationary",
    "Walking",
    "Driving",
    "Passenger",
    "Running",
    "Cycling",
    "Transit",
];

pub const ACTIVITY_SECTIONS: &[ActivitySection] = &[
    ActivitySection {
        title: "Work",
        items: &[
            "Focused Work",
            "Deep Work",
            "Emails/Admin",
            "Meetings",
            "Calls (Work)",
            "Planning",
            "Budgeting",
            "Job Search",
            "Client Work",
            "Paperwork",
            "Scheduling",
        ],
    },
    ActivitySection {
        title: "Learning",
        items: &[
            "Learning",
            "Studying",
            "Reading (Learning)",
            "Research",
            "Notes",
            "Practice Drills",
            "Tutorials",
            "Coding",
            "Drawing Study",
            "Language Practice",
        ],
    },
    ActivitySection {
        title: "Chores",
        items: &[
            "Cleaning",
            "Laundry",
            "Dishes",
            "Cooking",
            "Meal Prep",
            "Groceries",
            "Shopping",
            "Errands",
            "Organizing",
            "Decluttering",
            "Trash",
            "Pets",
            "Car Cleanup",
            "Yard Work",
        ],
    },
    ActivitySection {
        title: "Health",
        items: &[
            "Workout",
            "Cardio",
            "Weights",
            "Stretching",
            "Walk (Exercise)",
            "Meditation",
            "Breathwork",
            "Doctor/Appointment",
            "Therapy",
            "Hygiene",
            "Shower/Get Ready",
            "Skincare",
            "Nap",
            "Sleeping",
        ],
    },
    ActivitySection {
        title: "Social",
        items: &[
            "Conversation",
            "Socializing",
            "Hanging Out",
            "Family Time",
            "Dating",
            "Event/Outing",
            "Phone Call (Personal)",
            "Texting",
            "Community",
        ],
    },
    ActivitySection {
        title: "Entertainment",
        items: &[
            "Phone",
            "Scrolling",
            "Media",
            "TV",
            "Gaming",
            "Music",
            "Podcast",
            "YouTube",
            "Movies",
            "TikTok",
            "Reddit",
            "Streaming",
            "Idle",
        ],
    },
    ActivitySection {
        title: "Food",
        items: &[
            "Eating",
            "Cooking (Enjoyment)",
            "Coffee",
            "Restaurant",
            "Snack",
            "Hydrating",
        ],
    },
    ActivitySection {
        title: "Other",
        items: &[
            "Waiting",
            "Commuting",
            "Driving",
            "Passenger",
            "Travel",
            "Misc",
        ],
    },
];

pub fn is_known_location(label: &str) -> bool {
    LOCATIONS.contains(&label)
}

pub fn is_known_movement(label: &str) -> bool {
    MOVEMENTS.contains(&label)
}

pub fn is_known_activity(label: &str) -> bool {
    ACTIVITY_SECTIONS
        .iter()
        .any(|section| section.items.contains(&label))
}

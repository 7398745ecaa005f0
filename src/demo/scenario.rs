use std::time::Duration;

/// What the fake editor looks like from a given point in time on
pub struct DemoFrame {
    /// Time offset from scenario start
    pub at: Duration,
    /// Whether the editor process is running
    pub running: bool,
    /// Window titles, one per window
    pub titles: Vec<&'static str>,
}

/// Complete demo scenario
pub struct DemoScenario {
    /// Frames ordered by `at`
    pub frames: Vec<DemoFrame>,
    /// When the demo ends
    pub duration: Duration,
}

impl DemoScenario {
    /// The frame in effect after `elapsed`, if the scenario has started
    pub fn frame_at(&self, elapsed: Duration) -> Option<&DemoFrame> {
        self.frames.iter().rev().find(|frame| frame.at <= elapsed)
    }
}

/// Build the default demo scenario (~18 seconds, one render)
pub fn default_scenario() -> DemoScenario {
    let frames = vec![
        // t=0s: editor not launched yet
        DemoFrame {
            at: Duration::from_secs(0),
            running: false,
            titles: vec![],
        },
        // t=2s: launched, idle
        DemoFrame {
            at: Duration::from_secs(2),
            running: true,
            titles: vec!["Final Cut Pro"],
        },
        // t=4s: share started, progress in the window title
        DemoFrame {
            at: Duration::from_secs(4),
            running: true,
            titles: vec![
                "Final Cut Pro",
                "Sharing “Demo Project” – 12% – about 3 min",
            ],
        },
        DemoFrame {
            at: Duration::from_secs(6),
            running: true,
            titles: vec!["Final Cut Pro", "Sharing “Demo Project” – 37% – 2:10 remaining"],
        },
        DemoFrame {
            at: Duration::from_secs(8),
            running: true,
            titles: vec!["Final Cut Pro", "Sharing “Demo Project” – 64% – 1m 20s left"],
        },
        DemoFrame {
            at: Duration::from_secs(10),
            running: true,
            titles: vec![
                "Final Cut Pro",
                "Sharing “Demo Project” – 91% – about 10 seconds",
            ],
        },
        // t=12s: render finished
        DemoFrame {
            at: Duration::from_secs(12),
            running: true,
            titles: vec!["Final Cut Pro"],
        },
        // t=15s: editor quit
        DemoFrame {
            at: Duration::from_secs(15),
            running: false,
            titles: vec![],
        },
    ];

    DemoScenario {
        frames,
        duration: Duration::from_secs(18),
    }
}

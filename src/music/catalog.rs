//! Prompt ideas for realtime music. None of these lists is exhaustive; any text works.

pub const INSTRUMENTS: [&str; 63] = [
    "303 Acid Bass",
    "808 Hip Hop Beat",
    "Accordion",
    "Alto Saxophone",
    "Bagpipes",
    "Balalaika Ensemble",
    "Banjo",
    "Bass Clarinet",
    "Bongos",
    "Boomy Bass",
    "Bouzouki",
    "Buchla Synths",
    "Cello",
    "Charango",
    "Clavichord",
    "Conga Drums",
    "Didgeridoo",
    "Dirty Synths",
    "Djembe",
    "Drumline",
    "Dulcimer",
    "Fiddle",
    "Flamenco Guitar",
    "Funk Drums",
    "Glockenspiel",
    "Guitar",
    "Hang Drum",
    "Harmonica",
    "Harp",
    "Harpsichord",
    "Hurdy-gurdy",
    "Kalimba",
    "Koto",
    "Lyre",
    "Mandolin",
    "Maracas",
    "Marimba",
    "Mbira",
    "Mellotron",
    "Metallic Twang",
    "Moog Oscillations",
    "Ocarina",
    "Persian Tar",
    "Pipa",
    "Precision Bass",
    "Ragtime Piano",
    "Rhodes Piano",
    "Shamisen",
    "Shredding Guitar",
    "Sitar",
    "Slide Guitar",
    "Smooth Pianos",
    "Spacey Synths",
    "Steel Drum",
    "Synth Pads",
    "Tabla",
    "TR-909 Drum Machine",
    "Trumpet",
    "Tuba",
    "Vibraphone",
    "Viola Ensemble",
    "Warm Acoustic Guitar",
    "Woodwinds",
];

pub const GENRES: [&str; 65] = [
    "Acid Jazz",
    "Afrobeat",
    "Alternative Country",
    "Baroque",
    "Bengal Baul",
    "Bhangra",
    "Bluegrass",
    "Blues Rock",
    "Bossa Nova",
    "Breakbeat",
    "Celtic Folk",
    "Chillout",
    "Chiptune",
    "Classic Rock",
    "Contemporary R&B",
    "Cumbia",
    "Deep House",
    "Disco Funk",
    "Drum & Bass",
    "Dubstep",
    "EDM",
    "Electro Swing",
    "Funk Metal",
    "G-funk",
    "Garage Rock",
    "Glitch Hop",
    "Grime",
    "Hyperpop",
    "Indian Classical",
    "Indie Electronic",
    "Indie Folk",
    "Indie Pop",
    "Irish Folk",
    "Jam Band",
    "Jamaican Dub",
    "Jazz Fusion",
    "Latin Jazz",
    "Lo-Fi Hip Hop",
    "Marching Band",
    "Merengue",
    "New Jack Swing",
    "Minimal Techno",
    "Moombahton",
    "Neo-Soul",
    "Orchestral Score",
    "Piano Ballad",
    "Polka",
    "Post-Punk",
    "60s Psychedelic Rock",
    "Psytrance",
    "R&B",
    "Reggae",
    "Reggaeton",
    "Renaissance Music",
    "Salsa",
    "Shoegaze",
    "Ska",
    "Surf Rock",
    "Synthpop",
    "Techno",
    "Trance",
    "Trap Beat",
    "Trip Hop",
    "Vaporwave",
    "Witch house",
];

pub const MOODS: [&str; 29] = [
    "Acoustic Instruments",
    "Ambient",
    "Bright Tones",
    "Chill",
    "Crunchy Distortion",
    "Danceable",
    "Dreamy",
    "Echo",
    "Emotional",
    "Ethereal Ambience",
    "Experimental",
    "Fat Beats",
    "Funky",
    "Glitchy Effects",
    "Huge Drop",
    "Live Performance",
    "Lo-fi",
    "Ominous Drone",
    "Psychedelic",
    "Rich Orchestration",
    "Saturated Tones",
    "Subdued Melody",
    "Sustained Chords",
    "Swirling Phasers",
    "Tight Groove",
    "Unsettling",
    "Upbeat",
    "Virtuoso",
    "Weird Noises",
];

//! Word lists for synthesized type names.
//!
//! Order is part of the naming contract: reordering or editing these lists
//! renames every generated type.

pub const ADJECTIVES: &[&str] = &[
    "able", "acid", "agile", "airy", "alert", "amber", "ample", "ancient", "angry", "arctic",
    "ashen", "atomic", "autumn", "awake", "azure", "balmy", "bare", "basic", "bitter", "black",
    "bland", "blank", "blazing", "bleak", "blind", "blond", "blue", "bold", "bony", "bouncy",
    "brave", "brief", "bright", "brisk", "broad", "broken", "bronze", "brown", "bumpy", "busy",
    "calm", "candid", "carbon", "careful", "cheap", "cheerful", "chilly", "civil", "clean", "clear",
    "clever", "cloudy", "coarse", "cold", "cool", "copper", "coral", "cosmic", "cozy", "crimson",
    "crisp", "cuddly", "curly", "curved", "damp", "dapper", "daring", "dark", "dazzling", "dear",
    "deep", "dense", "dewy", "direct", "dizzy", "dry", "dusty", "eager", "early", "earthy",
    "easy", "elder", "electric", "empty", "endless", "epic", "equal", "even", "exact", "faded",
    "faint", "fair", "famous", "fancy", "fast", "fearless", "feisty", "fierce", "firm", "flat",
    "fluffy", "fond", "fragrant", "frank", "free", "fresh", "frosty", "funny", "fuzzy", "gentle",
    "giant", "gifted", "glad", "gleaming", "glossy", "golden", "grand", "gray", "great", "green",
    "grim", "happy", "hardy", "hasty", "hazy", "hidden", "hollow", "honest", "huge", "humble",
    "hungry", "icy", "idle", "inner", "iron", "ivory", "jade", "jolly", "jovial", "juicy",
    "keen", "kind", "large", "late", "lazy", "lean", "light", "little", "lively", "lofty",
    "lone", "long", "loud", "lucky", "lunar", "mellow", "merry", "mighty", "mild", "misty",
    "modern", "modest", "muddy", "narrow", "neat", "nimble", "noble", "noisy", "odd", "olive",
    "open", "orange", "pale", "patient", "plain", "plucky", "polar", "polite", "proud", "purple",
    "quick", "quiet", "rapid", "rare", "ready", "red", "regal", "rich", "rocky", "rosy",
    "rough", "round", "royal", "rusty", "sandy", "scarlet", "shaggy", "sharp", "shiny", "short",
    "shy", "silent", "silky", "silver", "simple", "sleek", "sleepy", "slim", "slow", "small",
    "smooth", "snowy", "soft", "solar", "solid", "spare", "spicy", "square", "stable", "steady",
    "steep", "still", "stormy", "strong", "sunny", "super", "sweet", "swift", "tall", "tame",
    "tender", "thick", "thin", "tidy", "tiny", "tough", "tranquil", "true", "twilight", "vast",
    "velvet", "vivid", "warm", "wary", "wavy", "wild", "windy", "wise", "witty", "young",
];

pub const NOUNS: &[&str] = &[
    "acorn", "anchor", "antelope", "apple", "arrow", "aspen", "badger", "bamboo", "banner", "basin",
    "beacon", "bear", "beaver", "bee", "beetle", "birch", "bison", "blossom", "boulder", "breeze",
    "brook", "buffalo", "butterfly", "cactus", "camel", "canyon", "cardinal", "castle", "cedar", "cheetah",
    "cherry", "cliff", "clover", "cloud", "cobra", "comet", "condor", "coral", "cougar", "coyote",
    "crane", "creek", "cricket", "crow", "crystal", "cypress", "daisy", "delta", "desert", "dolphin",
    "dove", "dragon", "dune", "eagle", "ember", "falcon", "fern", "ferret", "field", "finch",
    "fjord", "flame", "flint", "forest", "fox", "frog", "galaxy", "gazelle", "gecko", "geyser",
    "glacier", "goose", "granite", "grove", "gull", "harbor", "hare", "hawk", "hazel", "heron",
    "hill", "horizon", "hornet", "husky", "ibis", "iguana", "island", "jackal", "jaguar", "jasmine",
    "jay", "kestrel", "kiwi", "koala", "lagoon", "lake", "lantern", "lark", "leopard", "lily",
    "lion", "lizard", "llama", "lotus", "lynx", "magpie", "mammoth", "maple", "marmot", "meadow",
    "meteor", "mink", "mole", "moon", "moose", "moth", "mountain", "mouse", "newt", "oak",
    "ocean", "octopus", "orchid", "osprey", "otter", "owl", "panda", "panther", "parrot", "peak",
    "pebble", "pelican", "penguin", "pine", "planet", "plover", "pond", "poppy", "prairie", "puffin",
    "puma", "quail", "rabbit", "raccoon", "raven", "reef", "ridge", "river", "robin", "rose",
    "salmon", "sapphire", "sequoia", "shark", "shore", "sparrow", "spruce", "squirrel", "star", "stone",
    "stork", "stream", "summit", "sun", "swallow", "swan", "thistle", "thunder", "tiger", "toad",
    "tortoise", "toucan", "trout", "tulip", "tundra", "turtle", "valley", "violet", "viper", "walrus",
    "wasp", "waterfall", "wave", "weasel", "whale", "willow", "wind", "wolf", "wombat", "wren",
    "yak", "zebra", "zephyr", "badlands", "bay", "bluff", "cove", "crater", "estuary", "geode",
];
